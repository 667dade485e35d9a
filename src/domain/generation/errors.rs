//! Generation Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("氛围描述不能为空")]
    EmptyDescription,

    #[error("无效的提示词模板: {0}")]
    InvalidPromptTemplate(String),

    #[error("未知的音乐生成服务: {0}")]
    UnknownProvider(String),
}

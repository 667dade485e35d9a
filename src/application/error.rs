//! 应用层错误定义
//!
//! Generate 调用对外暴露的错误类型

use thiserror::Error;

use crate::application::ports::ProviderError;
use crate::domain::DomainError;

/// 生成错误
///
/// 可 Clone：single-flight 的所有等待者共享同一结果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// 请求无效（例如空描述）
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 所有服务都失败，携带最后一个尝试的服务的错误
    #[error("{provider}: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// 没有注册任何服务
    #[error("No APIs configured for audio generation")]
    NoProviders,

    /// 调用方取消
    #[error("Generation cancelled")]
    Cancelled,

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GenerationError {
    /// 最后一个服务的原始错误
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            GenerationError::Provider { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DomainError> for GenerationError {
    fn from(err: DomainError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

//! Music Provider Port - 外部音乐生成服务抽象
//!
//! 每个服务一个适配器，负责请求体构造、HTTP 调用和响应归一化，
//! 具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{GenerationRequest, ProviderCredentials};

/// 单次服务调用的错误
///
/// 除 RateLimited 外均为终止性错误：不重试，直接回退到下一个服务
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{provider} API configuration missing")]
    NotConfigured { provider: String },

    #[error("API rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API server error: {status}")]
    ServerError { status: u16 },

    #[error("API request failed: {status} - {body}")]
    RequestRejected { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No audio reference returned from {provider} API")]
    NoAudioReference { provider: String },

    #[error("Failed to download audio from {url}: {status}")]
    DownloadFailed { url: String, status: u16 },
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// 适配器归一化后的输出
#[derive(Debug, Clone)]
pub struct ProviderAudio {
    /// 原始音频数据
    pub audio_data: Vec<u8>,
    /// 下载音频使用的 URL
    pub source_url: String,
    /// 服务原始响应（Udio 额外包含选中的 clip）
    pub metadata: serde_json::Value,
}

/// Music Provider Port
#[async_trait]
pub trait MusicProviderPort: Send + Sync {
    /// 服务名称（用于日志）
    fn name(&self) -> &str;

    /// 执行一次生成：POST 生成请求，再 GET 下载音频
    ///
    /// 不处理限流重试，原始错误直接向上返回
    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &ProviderCredentials,
    ) -> Result<ProviderAudio, ProviderError>;
}

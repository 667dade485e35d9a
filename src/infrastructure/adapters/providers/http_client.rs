//! Provider HTTP Client - 所有服务适配器共用的 HTTP 传输
//!
//! 状态码映射只在这里处理，适配器只关心请求体和响应结构:
//! - 200: 解析 JSON
//! - 429: RateLimited（读取 Retry-After 秒数）
//! - >=500: ServerError
//! - 其它: RequestRejected

use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::ProviderError;
use crate::domain::ProviderCredentials;

/// HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct ProviderHttpConfig {
    /// 单次请求总超时（秒）
    pub timeout_secs: u64,
}

impl Default for ProviderHttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

/// 服务 HTTP 客户端
///
/// 内部 reqwest::Client 复用连接池，clone 开销很小
#[derive(Debug, Clone)]
pub struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    pub fn new(config: &ProviderHttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }

    /// 发送生成请求，返回 JSON 响应
    pub async fn submit<B: Serialize + ?Sized>(
        &self,
        provider: &str,
        credentials: &ProviderCredentials,
        body: &B,
    ) -> Result<serde_json::Value, ProviderError> {
        tracing::debug!(
            provider = %provider,
            endpoint = %credentials.endpoint,
            "Sending generation request"
        );

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(&credentials.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.api_key))
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        tracing::debug!(
            provider = %provider,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation request completed"
        );

        match status {
            StatusCode::OK => response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse JSON: {}", e))),
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited {
                retry_after: retry_after(&response),
            }),
            s if s.is_server_error() => {
                tracing::error!(provider = %provider, status = s.as_u16(), "API server error");
                Err(ProviderError::ServerError { status: s.as_u16() })
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(
                    provider = %provider,
                    status = s.as_u16(),
                    body = %body,
                    "API request failed"
                );
                Err(ProviderError::RequestRejected {
                    status: s.as_u16(),
                    body,
                })
            }
        }
    }

    /// 下载音频字节
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProviderError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        tracing::debug!(url = %url, audio_size = audio_data.len(), "Audio downloaded");
        Ok(audio_data)
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::NetworkError(format!("Cannot connect to provider: {}", e))
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

//! Data Transfer Objects

use serde::{Deserialize, Serialize};

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Generate DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub ambiance: String,
}

/// 生成结果的响应头
pub mod headers {
    pub const PROVIDER_USED: &str = "x-provider-used";
    pub const CACHE_HIT: &str = "x-cache-hit";
    pub const GENERATION_TIME_MS: &str = "x-generation-time-ms";
    pub const CACHE_KEY: &str = "x-cache-key";
}

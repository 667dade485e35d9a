//! Generate Handlers

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::infrastructure::http::dto::{headers, GenerateRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

const AUDIO_CONTENT_TYPE: &str = "audio/wav";

/// 按氛围描述生成循环音频
///
/// 响应体为音频字节，生成信息放在响应头中
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, ApiError> {
    let result = state
        .orchestrator
        .generate_with_cancel(&req.ambiance, &state.shutdown)
        .await?;

    tracing::info!(
        provider = %result.provider_used,
        cache_hit = result.cache_hit,
        cache_key = %result.cache_key,
        generation_time_ms = result.generation_time_ms,
        audio_size = result.audio_data.len(),
        "Audio loop ready"
    );

    let response_headers = [
        ("content-type", AUDIO_CONTENT_TYPE.to_string()),
        (headers::PROVIDER_USED, result.provider_used),
        (headers::CACHE_HIT, result.cache_hit.to_string()),
        (headers::GENERATION_TIME_MS, result.generation_time_ms.to_string()),
        (headers::CACHE_KEY, result.cache_key.to_string()),
    ];

    Ok((response_headers, result.audio_data).into_response())
}

//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping           GET   健康检查
//! - /api/generate       POST  按氛围描述生成循环音频（返回 audio/wav）
//! - /api/cache/stats    GET   缓存统计

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/generate", post(handlers::generate))
        .nest("/cache", cache_routes())
}

/// Cache 路由
fn cache_routes() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(handlers::cache_stats))
}

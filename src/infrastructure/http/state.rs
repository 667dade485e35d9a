//! Application State
//!
//! 所有 handler 共享的应用状态

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::{AudioCachePort, GenerationOrchestrator};

/// 应用状态
pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub audio_cache: Arc<dyn AudioCachePort>,
    /// 服务关闭时取消，进行中的生成随之结束
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<GenerationOrchestrator>,
        audio_cache: Arc<dyn AudioCachePort>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            orchestrator,
            audio_cache,
            shutdown,
        }
    }
}

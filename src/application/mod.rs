//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（MusicProvider、AudioCache）
//! - orchestrator: 缓存优先、按优先级回退的生成编排，含限流重试、并发限制、请求合并
//! - error: 应用层错误定义

pub mod error;
pub mod orchestrator;
pub mod ports;

pub use error::GenerationError;

pub use orchestrator::{
    ConcurrencyLimiter, GenerationOrchestrator, GenerationResult, OrchestratorConfig,
    RegisteredProvider, RetryPolicy, SingleFlight, CACHE_PROVIDER,
};

pub use ports::{
    // Audio cache
    AudioCachePort,
    CacheEntry,
    CacheError,
    CacheStats,
    // Music provider
    MusicProviderPort,
    ProviderAudio,
    ProviderError,
};

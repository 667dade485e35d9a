//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod music_provider;

pub use audio_cache::{AudioCachePort, CacheEntry, CacheError, CacheStats};
pub use music_provider::{MusicProviderPort, ProviderAudio, ProviderError};

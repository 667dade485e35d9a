//! Infrastructure Adapters
//!
//! 六边形架构的出站适配器实现

pub mod providers;

pub use providers::{
    build_provider, ProviderHttpClient, ProviderHttpConfig, StableAudioProvider, SunoProvider,
    UdioProvider,
};

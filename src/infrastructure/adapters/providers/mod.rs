//! Music Provider Adapters
//!
//! 每种服务一个适配器，共享同一个 HTTP 客户端

mod http_client;
mod stable_audio;
mod suno;
mod udio;

pub use http_client::{ProviderHttpClient, ProviderHttpConfig};
pub use stable_audio::StableAudioProvider;
pub use suno::SunoProvider;
pub use udio::UdioProvider;

use std::sync::Arc;

use crate::application::ports::MusicProviderPort;
use crate::domain::ProviderKind;

/// 按服务类型创建适配器
pub fn build_provider(kind: ProviderKind, client: ProviderHttpClient) -> Arc<dyn MusicProviderPort> {
    match kind {
        ProviderKind::Suno => Arc::new(SunoProvider::new(client)),
        ProviderKind::Udio => Arc::new(UdioProvider::new(client)),
        ProviderKind::StableAudio => Arc::new(StableAudioProvider::new(client)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_by_kind() {
        let client = ProviderHttpClient::new(&ProviderHttpConfig::default()).unwrap();

        assert_eq!(build_provider(ProviderKind::Suno, client.clone()).name(), "suno");
        assert_eq!(build_provider(ProviderKind::Udio, client.clone()).name(), "udio");
        assert_eq!(build_provider(ProviderKind::StableAudio, client).name(), "stable_audio");
    }
}

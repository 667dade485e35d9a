//! Stable Audio API Adapter
//!
//! 请求不带采样参数，固定 `preset: "instrumental"` 和 `lucky: true`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderHttpClient;
use crate::application::ports::{MusicProviderPort, ProviderAudio, ProviderError};
use crate::domain::{GenerationRequest, ProviderCredentials, ProviderKind};

const PRESET: &str = "instrumental";

#[derive(Debug, Serialize)]
struct StableAudioPayload<'a> {
    prompt: &'a str,
    duration: u32,
    is_instrumental: bool,
    model: &'a str,
    preset: &'static str,
    lucky: bool,
}

impl<'a> From<&'a GenerationRequest> for StableAudioPayload<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            prompt: request.prompt(),
            duration: request.duration_secs(),
            is_instrumental: true,
            model: request.model_id(),
            preset: PRESET,
            lucky: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StableAudioResponse {
    audio_url: Option<String>,
}

/// Stable Audio 适配器
#[derive(Debug, Clone)]
pub struct StableAudioProvider {
    client: ProviderHttpClient,
}

impl StableAudioProvider {
    pub fn new(client: ProviderHttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MusicProviderPort for StableAudioProvider {
    fn name(&self) -> &str {
        ProviderKind::StableAudio.as_str()
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &ProviderCredentials,
    ) -> Result<ProviderAudio, ProviderError> {
        let api_response = self
            .client
            .submit(self.name(), credentials, &StableAudioPayload::from(request))
            .await?;

        let parsed: StableAudioResponse = serde_json::from_value(api_response.clone())
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let audio_url = parsed
            .audio_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ProviderError::NoAudioReference {
                provider: self.name().to_string(),
            })?;

        let audio_data = self.client.download(&audio_url).await?;

        Ok(ProviderAudio {
            audio_data,
            source_url: audio_url,
            metadata: serde_json::json!({ "api_response": api_response }),
        })
    }
}

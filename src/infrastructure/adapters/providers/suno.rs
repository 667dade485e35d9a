//! Suno API Adapter
//!
//! 请求: `{prompt, duration, instrumental, model, temperature, top_p, guidance_scale}`
//! 响应: 顶层 `audio_url`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderHttpClient;
use crate::application::ports::{MusicProviderPort, ProviderAudio, ProviderError};
use crate::domain::{GenerationRequest, ProviderCredentials, ProviderKind};

#[derive(Debug, Serialize)]
struct SunoPayload<'a> {
    prompt: &'a str,
    duration: u32,
    instrumental: bool,
    model: &'a str,
    temperature: f32,
    top_p: f32,
    guidance_scale: f32,
}

impl<'a> From<&'a GenerationRequest> for SunoPayload<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            prompt: request.prompt(),
            duration: request.duration_secs(),
            instrumental: true,
            model: request.model_id(),
            temperature: request.temperature(),
            top_p: request.top_p(),
            guidance_scale: request.guidance_scale(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SunoResponse {
    audio_url: Option<String>,
}

/// Suno 适配器
#[derive(Debug, Clone)]
pub struct SunoProvider {
    client: ProviderHttpClient,
}

impl SunoProvider {
    pub fn new(client: ProviderHttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MusicProviderPort for SunoProvider {
    fn name(&self) -> &str {
        ProviderKind::Suno.as_str()
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &ProviderCredentials,
    ) -> Result<ProviderAudio, ProviderError> {
        let api_response = self
            .client
            .submit(self.name(), credentials, &SunoPayload::from(request))
            .await?;

        let parsed: SunoResponse = serde_json::from_value(api_response.clone())
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

//! Udio API Adapter
//!
//! 请求字段与其它服务不同: `duration_secs`、`is_instrumental`、`cfg_scale`。
//! 响应返回 `clips` 列表，取第一个 clip 的 `audio_url`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderHttpClient;
use crate::application::ports::{MusicProviderPort, ProviderAudio, ProviderError};
use crate::domain::{GenerationRequest, ProviderCredentials, ProviderKind};

#[derive(Debug, Serialize)]
struct UdioPayload<'a> {
    prompt: &'a str,
    duration_secs: u32,
    is_instrumental: bool,
    model: &'a str,
    temperature: f32,
    top_p: f32,
    cfg_scale: f32,
}

impl<'a> From<&'a GenerationRequest> for UdioPayload<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            prompt: request.prompt(),
            duration_secs: request.duration_secs(),
            is_instrumental: true,
            model: request.model_id(),
            temperature: request.temperature(),
            top_p: request.top_p(),
            cfg_scale: request.guidance_scale(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UdioResponse {
    #[serde(default)]
    clips: Option<Vec<serde_json::Value>>,
}

/// Udio 适配器
#[derive(Debug, Clone)]
pub struct UdioProvider {
    client: ProviderHttpClient,
}

impl UdioProvider {
    pub fn new(client: ProviderHttpClient) -> Self {
        Self { client }
    }

    fn no_audio(&self) -> ProviderError {
        ProviderError::NoAudioReference {
            provider: self.name().to_string(),
        }
    }
}

#[async_trait]
impl MusicProviderPort for UdioProvider {
    fn name(&self) -> &str {
        ProviderKind::Udio.as_str()
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &ProviderCredentials,
    ) -> Result<ProviderAudio, ProviderError> {
        let api_response = self
            .client
            .submit(self.name(), credentials, &UdioPayload::from(request))
            .await?;

        let parsed: UdioResponse = serde_json::from_value(api_response.clone())
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let clip = parsed
            .clips
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| self.no_audio())?;
        let audio_url = clip
            .get("audio_url")
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| self.no_audio())?;

        let audio_data = self.client.download(&audio_url).await?;

        Ok(ProviderAudio {
            audio_data,
            source_url: audio_url,
            metadata: serde_json::json!({
                "api_response": api_response,
                "clip_info": clip,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GenerationParams;
    use crate::infrastructure::adapters::providers::ProviderHttpConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> UdioProvider {
        UdioProvider::new(ProviderHttpClient::new(&ProviderHttpConfig::default()).unwrap())
    }

    fn request() -> GenerationRequest {
        GenerationRequest::from_ambiance("rainy city", &GenerationParams::default()).unwrap()
    }

    fn credentials(server: &MockServer) -> ProviderCredentials {
        ProviderCredentials {
            endpoint: format!("{}/udio", server.uri()),
            api_key: "udio-key".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_uses_first_clip() {
        let server = MockServer::start().await;
        let first = format!("{}/clips/1.wav", server.uri());
        let second = format!("{}/clips/2.wav", server.uri());

        Mock::given(method("POST"))
            .and(path("/udio"))
            .and(body_json(json!({
                "prompt": "Instrumental music for a rainy city ambiance",
                "duration_secs": 30,
                "is_instrumental": true,
                "model": "default",
                "temperature": 0.7,
                "top_p": 0.9,
                "cfg_scale": 3.0,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "clips": [
                    { "id": "c1", "audio_url": first },
                    { "id": "c2", "audio_url": second },
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clips/1.wav"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"AB".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let audio = provider().generate(&request(), &credentials(&server)).await.unwrap();

        assert_eq!(audio.audio_data, b"AB");
        assert_eq!(audio.source_url, first);
        assert_eq!(audio.metadata["clip_info"]["id"], "c1");
        assert!(audio.metadata["api_response"]["clips"].is_array());
    }

    #[tokio::test]
    async fn test_empty_clips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "clips": [] })))
            .mount(&server)
            .await;

        let err = provider()
            .generate(&request(), &credentials(&server))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::NoAudioReference {
                provider: "udio".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_null_clips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "clips": null })))
            .mount(&server)
            .await;

        let err = provider()
            .generate(&request(), &credentials(&server))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::NoAudioReference {
                provider: "udio".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_clip_without_audio_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "clips": [{ "id": "c1" }] })))
            .mount(&server)
            .await;

        let err = provider()
            .generate(&request(), &credentials(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoAudioReference { .. }));
    }
}

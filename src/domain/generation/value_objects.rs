//! Generation Context - Value Objects

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::DomainError;

/// 提示词模板中的氛围占位符
pub const AMBIANCE_PLACEHOLDER: &str = "{ambiance}";

/// 生成参数默认值（来自配置）
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// 提示词模板，必须包含 `{ambiance}`
    pub prompt_template: String,
    /// 循环时长（秒）
    pub duration_secs: u32,
    pub model_id: String,
    pub temperature: f32,
    pub top_p: f32,
    pub guidance_scale: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt_template: "Instrumental music for a {ambiance} ambiance".to_string(),
            duration_secs: 30,
            model_id: "default".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            guidance_scale: 3.0,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.prompt_template.contains(AMBIANCE_PLACEHOLDER) {
            return Err(DomainError::InvalidPromptTemplate(format!(
                "template must contain {}",
                AMBIANCE_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

/// 生成请求
///
/// 构造后不可变，字段只读
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    duration_secs: u32,
    model_id: String,
    temperature: f32,
    top_p: f32,
    guidance_scale: f32,
}

impl GenerationRequest {
    /// 由氛围描述和配置默认值构造请求
    pub fn from_ambiance(description: &str, params: &GenerationParams) -> Result<Self, DomainError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(DomainError::EmptyDescription);
        }

        Ok(Self {
            prompt: params
                .prompt_template
                .replace(AMBIANCE_PLACEHOLDER, description),
            duration_secs: params.duration_secs,
            model_id: params.model_id.clone(),
            temperature: params.temperature,
            top_p: params.top_p,
            guidance_scale: params.guidance_scale,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    pub fn guidance_scale(&self) -> f32 {
        self.guidance_scale
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_request(self)
    }
}

/// 参与缓存 key 计算的字段，按字典序声明以保证序列化稳定
#[derive(Serialize)]
struct CacheKeyFields<'a> {
    duration: u32,
    model: &'a str,
    prompt: &'a str,
}

/// 缓存 key
///
/// md5(canonical_json(duration, model, prompt))，32 位小写十六进制
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(request: &GenerationRequest) -> Self {
        let fields = CacheKeyFields {
            duration: request.duration_secs,
            model: &request.model_id,
            prompt: &request.prompt,
        };
        // 仅包含 u32 与 &str 的结构体序列化不会失败
        let canonical = serde_json::to_string(&fields).unwrap_or_default();
        Self(format!("{:x}", md5::compute(canonical.as_bytes())))
    }

    /// 从已有的十六进制串恢复（例如缓存文件名）
    pub fn parse(hex: &str) -> Option<Self> {
        let valid = hex.len() == 32 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 外部音乐生成服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Suno,
    Udio,
    StableAudio,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Suno => "suno",
            ProviderKind::Udio => "udio",
            ProviderKind::StableAudio => "stable_audio",
        }
    }

    /// 默认回退顺序中的优先级
    pub fn default_priority(&self) -> u32 {
        match self {
            ProviderKind::Suno => 0,
            ProviderKind::Udio => 1,
            ProviderKind::StableAudio => 2,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suno" => Ok(ProviderKind::Suno),
            "udio" => Ok(ProviderKind::Udio),
            "stable_audio" | "stable-audio" | "stableaudio" => Ok(ProviderKind::StableAudio),
            _ => Err(DomainError::UnknownProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 服务描述（静态配置，运行期不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    pub name: String,
    pub kind: ProviderKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub priority: u32,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: ProviderKind,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint: non_blank(endpoint.into()),
            api_key: non_blank(api_key.into()),
            priority,
        }
    }

    /// endpoint 和 api_key 都存在时返回调用凭据
    pub fn credentials(&self) -> Option<ProviderCredentials> {
        match (&self.endpoint, &self.api_key) {
            (Some(endpoint), Some(api_key)) => Some(ProviderCredentials {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
            }),
            _ => None,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// 单次调用所需的服务端点与密钥
#[derive(Clone, PartialEq)]
pub struct ProviderCredentials {
    pub endpoint: String,
    pub api_key: String,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt_ambiance: &str, duration: u32, model: &str) -> GenerationRequest {
        let params = GenerationParams {
            duration_secs: duration,
            model_id: model.to_string(),
            ..Default::default()
        };
        GenerationRequest::from_ambiance(prompt_ambiance, &params).unwrap()
    }

    #[test]
    fn test_prompt_from_template() {
        let req = request("  mysterious forest ", 30, "default");
        assert_eq!(
            req.prompt(),
            "Instrumental music for a mysterious forest ambiance"
        );
        assert_eq!(req.duration_secs(), 30);
        assert_eq!(req.model_id(), "default");
    }

    #[test]
    fn test_empty_description_rejected() {
        let result = GenerationRequest::from_ambiance("   ", &GenerationParams::default());
        assert_eq!(result.unwrap_err(), DomainError::EmptyDescription);
    }

    #[test]
    fn test_cache_key_is_stable() {
        let a = request("forest", 30, "default");
        let b = request("forest", 30, "default");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().as_str().len(), 32);
    }

    #[test]
    fn test_cache_key_canonical_form() {
        let params = GenerationParams {
            prompt_template: "{ambiance}".to_string(),
            ..Default::default()
        };
        let req = GenerationRequest::from_ambiance("forest ambiance", &params).unwrap();
        let expected = format!(
            "{:x}",
            md5::compute(r#"{"duration":30,"model":"default","prompt":"forest ambiance"}"#)
        );
        assert_eq!(req.cache_key().as_str(), expected);
    }

    #[test]
    fn test_cache_key_differs_per_identity_field() {
        let base = request("forest", 30, "default").cache_key();
        assert_ne!(base, request("desert", 30, "default").cache_key());
        assert_ne!(base, request("forest", 45, "default").cache_key());
        assert_ne!(base, request("forest", 30, "v2").cache_key());
    }

    #[test]
    fn test_cache_key_ignores_sampling_params() {
        let params = GenerationParams {
            temperature: 1.2,
            top_p: 0.5,
            guidance_scale: 7.0,
            ..Default::default()
        };
        let tuned = GenerationRequest::from_ambiance("forest", &params).unwrap();
        assert_eq!(tuned.cache_key(), request("forest", 30, "default").cache_key());
    }

    #[test]
    fn test_cache_key_parse() {
        let key = request("forest", 30, "default").cache_key();
        assert_eq!(CacheKey::parse(key.as_str()), Some(key));
        assert_eq!(CacheKey::parse("not-a-key"), None);
    }

    #[test]
    fn test_template_validation() {
        let params = GenerationParams {
            prompt_template: "no placeholder".to_string(),
            ..Default::default()
        };
        assert!(params.validate().is_err());
        assert!(GenerationParams::default().validate().is_ok());
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("suno".parse::<ProviderKind>().unwrap(), ProviderKind::Suno);
        assert_eq!("Stable_Audio".parse::<ProviderKind>().unwrap(), ProviderKind::StableAudio);
        assert!("riffusion".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_descriptor_credentials() {
        let ok = ProviderDescriptor::new("suno", ProviderKind::Suno, "http://x", "key", 0);
        assert!(ok.credentials().is_some());

        let blank_key = ProviderDescriptor::new("udio", ProviderKind::Udio, "http://x", "  ", 1);
        assert_eq!(blank_key.api_key, None);
        assert!(blank_key.credentials().is_none());

        let no_endpoint = ProviderDescriptor::new("udio", ProviderKind::Udio, "", "key", 1);
        assert!(no_endpoint.credentials().is_none());
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = ProviderCredentials {
            endpoint: "http://x".to_string(),
            api_key: "secret".to_string(),
        };
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}

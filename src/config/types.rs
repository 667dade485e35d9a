//! Configuration Types
//!
//! 定义所有配置结构体，以及到运行期组件配置的转换

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::application::orchestrator::{OrchestratorConfig, RetryPolicy};
use crate::domain::{DomainError, GenerationParams, ProviderDescriptor, ProviderKind};
use crate::infrastructure::adapters::ProviderHttpConfig;
use crate::infrastructure::persistence::FileCacheConfig;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成参数
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 限流重试配置
    #[serde(default)]
    pub retry: RetryConfig,

    /// 出站 HTTP 配置
    #[serde(default)]
    pub http: HttpConfig,

    /// 外部服务，key 为服务名
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
            providers: default_providers(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 编排器配置
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            params: self.generation.params(),
            max_concurrent_requests: self.generation.max_concurrent_requests,
            retry: self.retry.policy(),
            single_flight: self.generation.single_flight,
        }
    }

    /// 已启用服务的描述列表（未排序，排序由编排器负责）
    pub fn provider_descriptors(&self) -> Result<Vec<ProviderDescriptor>, DomainError> {
        self.providers
            .iter()
            .filter(|(_, provider)| provider.enabled)
            .map(|(name, provider)| provider.descriptor(name))
            .collect()
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 循环时长（秒）
    #[serde(default = "default_loop_duration")]
    pub loop_duration_secs: u32,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,

    /// 提示词模板，必须包含 `{ambiance}`
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// 同时进行的外部调用上限
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// 合并相同 key 的并发请求
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

fn default_loop_duration() -> u32 {
    30
}

fn default_model() -> String {
    "default".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_guidance_scale() -> f32 {
    3.0
}

fn default_prompt_template() -> String {
    "Instrumental music for a {ambiance} ambiance".to_string()
}

fn default_max_concurrent() -> usize {
    3
}

fn default_single_flight() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            loop_duration_secs: default_loop_duration(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            guidance_scale: default_guidance_scale(),
            prompt_template: default_prompt_template(),
            max_concurrent_requests: default_max_concurrent(),
            single_flight: default_single_flight(),
        }
    }
}

impl GenerationConfig {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            prompt_template: self.prompt_template.clone(),
            duration_secs: self.loop_duration_secs,
            model_id: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            guidance_scale: self.guidance_scale,
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// 条目有效期（秒）
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/audio")
}

fn default_cache_ttl() -> u64 {
    3600 // 1 小时
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn file_cache_config(&self) -> FileCacheConfig {
        FileCacheConfig {
            dir: self.dir.clone(),
            ttl: Duration::from_secs(self.ttl_secs),
        }
    }
}

/// 限流重试配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// 缺少 Retry-After 时的首次等待（秒）
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,

    /// 单次等待上限（秒）
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

fn default_max_rate_limit_retries() -> u32 {
    5
}

fn default_retry_after_secs() -> u64 {
    1
}

fn default_max_backoff_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: default_max_rate_limit_retries(),
            default_retry_after_secs: default_retry_after_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_rate_limit_retries,
            Duration::from_secs(self.default_retry_after_secs),
            Duration::from_secs(self.max_backoff_secs),
        )
    }
}

/// 出站 HTTP 配置
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// 单次请求超时（秒），生成接口通常很慢
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_http_timeout() -> u64 {
    300
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn provider_http_config(&self) -> ProviderHttpConfig {
        ProviderHttpConfig {
            timeout_secs: self.timeout_secs,
        }
    }
}

/// 单个外部服务配置
///
/// endpoint 或 api_key 为空时服务仍会注册，生成时被跳过
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// 服务类型，缺省时由服务名推断
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    /// 数值越小越先尝试，缺省时使用服务类型的默认顺序
    #[serde(default)]
    pub priority: Option<u32>,

    #[serde(default = "default_provider_enabled")]
    pub enabled: bool,
}

fn default_provider_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// 解析服务类型
    pub fn resolve_kind(&self, name: &str) -> Result<ProviderKind, DomainError> {
        ProviderKind::from_str(self.kind.as_deref().unwrap_or(name))
    }

    pub fn descriptor(&self, name: &str) -> Result<ProviderDescriptor, DomainError> {
        let kind = self.resolve_kind(name)?;
        Ok(ProviderDescriptor::new(
            name,
            kind,
            self.endpoint.as_str(),
            self.api_key.as_str(),
            self.priority.unwrap_or_else(|| kind.default_priority()),
        ))
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    [ProviderKind::Suno, ProviderKind::Udio, ProviderKind::StableAudio]
        .into_iter()
        .map(|kind| {
            (
                kind.as_str().to_string(),
                ProviderConfig {
                    priority: Some(kind.default_priority()),
                    enabled: true,
                    ..Default::default()
                },
            )
        })
        .collect()
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

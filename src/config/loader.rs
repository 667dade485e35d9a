//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::ProviderKind;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `AMBILOOP_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `AMBILOOP_SERVER__PORT=8080`
/// - `AMBILOOP_CACHE__TTL_SECS=600`
/// - `AMBILOOP_PROVIDERS__SUNO__ENDPOINT=https://api.suno.example/generate`
/// - `AMBILOOP_PROVIDERS__SUNO__API_KEY=...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("generation.loop_duration_secs", 30)?
        .set_default("generation.model", "default")?
        .set_default("generation.temperature", 0.7)?
        .set_default("generation.top_p", 0.9)?
        .set_default("generation.guidance_scale", 3.0)?
        .set_default(
            "generation.prompt_template",
            "Instrumental music for a {ambiance} ambiance",
        )?
        .set_default("generation.max_concurrent_requests", 3)?
        .set_default("generation.single_flight", true)?
        .set_default("cache.dir", "cache/audio")?
        .set_default("cache.ttl_secs", 3600)?
        .set_default("retry.max_rate_limit_retries", 5)?
        .set_default("retry.default_retry_after_secs", 1)?
        .set_default("retry.max_backoff_secs", 30)?
        .set_default("http.timeout_secs", 300)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    for kind in [ProviderKind::Suno, ProviderKind::Udio, ProviderKind::StableAudio] {
        let prefix = format!("providers.{}", kind.as_str());
        builder = builder
            .set_default(format!("{}.endpoint", prefix), "")?
            .set_default(format!("{}.api_key", prefix), "")?
            .set_default(format!("{}.priority", prefix), i64::from(kind.default_priority()))?
            .set_default(format!("{}.enabled", prefix), true)?;
    }

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: AMBILOOP_PROVIDERS__STABLE_AUDIO__API_KEY=...
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("AMBILOOP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
///
/// 服务缺少 endpoint 或 api_key 不算错误，生成时跳过
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.generation.loop_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Loop duration must be greater than 0".to_string(),
        ));
    }

    if config.generation.max_concurrent_requests == 0 {
        return Err(ConfigError::ValidationError(
            "max_concurrent_requests must be greater than 0".to_string(),
        ));
    }

    config
        .generation
        .params()
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.retry.max_backoff_secs < config.retry.default_retry_after_secs {
        return Err(ConfigError::ValidationError(
            "retry.max_backoff_secs cannot be less than retry.default_retry_after_secs".to_string(),
        ));
    }

    for (name, provider) in &config.providers {
        provider
            .resolve_kind(name)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!(
        "Loop: {}s, model: {}",
        config.generation.loop_duration_secs,
        config.generation.model
    );
    tracing::info!("Prompt Template: {}", config.generation.prompt_template);
    tracing::info!(
        "Max Concurrent Requests: {}",
        config.generation.max_concurrent_requests
    );
    tracing::info!("Single Flight: {}", config.generation.single_flight);
    tracing::info!("Cache Directory: {:?}", config.cache.dir);
    tracing::info!("Cache TTL: {}s", config.cache.ttl_secs);
    tracing::info!(
        "Rate Limit Retries: {} (max backoff {}s)",
        config.retry.max_rate_limit_retries,
        config.retry.max_backoff_secs
    );
    tracing::info!("HTTP Timeout: {}s", config.http.timeout_secs);
    for (name, provider) in &config.providers {
        tracing::info!(
            "Provider {}: enabled={}, priority={:?}, configured={}",
            name,
            provider.enabled,
            provider.priority,
            provider.is_configured()
        );
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

/// 对缺少 endpoint 或 api_key 的已启用服务发出警告
///
/// 返回未配置的服务名
pub fn warn_missing_credentials(config: &AppConfig) -> Vec<String> {
    let missing: Vec<String> = config
        .providers
        .iter()
        .filter(|(_, provider)| provider.enabled && !provider.is_configured())
        .map(|(name, _)| name.clone())
        .collect();

    for name in &missing {
        tracing::warn!(
            provider = %name,
            "{} API key or endpoint not configured",
            name.to_uppercase()
        );
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.http.timeout_secs, 300);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.generation.max_concurrent_requests = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_template_without_placeholder() {
        let mut config = AppConfig::default();
        config.generation.prompt_template = "calm music".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_backoff_below_default_delay() {
        let mut config = AppConfig::default();
        config.retry.default_retry_after_secs = 10;
        config.retry.max_backoff_secs = 5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_provider() {
        let mut config = AppConfig::default();
        config
            .providers
            .insert("musicgen".to_string(), Default::default());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_merges_defaults() {
        let file = write_config(
            r#"
[cache]
ttl_secs = 120

[providers.suno]
endpoint = "https://suno.example/generate"
api_key = "suno-key"

[providers.backup]
kind = "udio"
endpoint = "https://udio-mirror.example/generate"
api_key = "backup-key"
priority = 5
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.generation.loop_duration_secs, 30);
        assert_eq!(config.providers.len(), 4);

        let suno = &config.providers["suno"];
        assert!(suno.is_configured());
        assert_eq!(suno.priority, Some(0));

        let backup = config.providers["backup"].descriptor("backup").unwrap();
        assert_eq!(backup.kind, ProviderKind::Udio);
        assert_eq!(backup.priority, 5);

        let missing = warn_missing_credentials(&config);
        assert_eq!(missing, vec!["stable_audio".to_string(), "udio".to_string()]);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let file = write_config(
            r#"
[generation]
loop_duration_secs = 0
"#,
        );

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}

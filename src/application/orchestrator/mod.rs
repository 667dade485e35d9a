//! Generation Orchestrator - 多服务容错生成编排
//!
//! Generate(ambiance) 流程:
//! 1. 构造 GenerationRequest，计算 CacheKey
//! 2. 查缓存，命中直接返回
//! 3. 按优先级依次尝试服务：获取并发槽位 → 适配器调用（限流重试）→ 释放槽位
//! 4. 首个成功结果写回缓存并返回；全部失败时返回最后一个服务的错误
//!
//! 同一 CacheKey 的并发调用通过 SingleFlight 合并为一次生成。

mod limiter;
mod retry;
mod single_flight;

pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use retry::RetryPolicy;
pub use single_flight::SingleFlight;

use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::error::GenerationError;
use crate::application::ports::{AudioCachePort, CacheEntry, MusicProviderPort, ProviderError};
use crate::domain::{CacheKey, GenerationParams, GenerationRequest, ProviderDescriptor};

/// 缓存命中时的 provider_used
pub const CACHE_PROVIDER: &str = "cache";

type Outcome = Result<GenerationResult, GenerationError>;

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub audio_data: Vec<u8>,
    /// 服务名称，缓存命中时为 "cache"
    pub provider_used: String,
    pub generation_time_ms: u64,
    pub cache_hit: bool,
    pub cache_key: CacheKey,
    pub metadata: serde_json::Value,
}

impl GenerationResult {
    fn from_cache(entry: CacheEntry) -> Self {
        Self {
            metadata: json!({
                "cached_at": entry.stored_at.to_rfc3339(),
                "cache_key": entry.key.as_str(),
            }),
            audio_data: entry.audio_data,
            provider_used: CACHE_PROVIDER.to_string(),
            generation_time_ms: 0,
            cache_hit: true,
            cache_key: entry.key,
        }
    }
}

/// 已注册的服务：静态描述 + 适配器
#[derive(Clone)]
pub struct RegisteredProvider {
    pub descriptor: ProviderDescriptor,
    pub adapter: Arc<dyn MusicProviderPort>,
}

impl RegisteredProvider {
    pub fn new(descriptor: ProviderDescriptor, adapter: Arc<dyn MusicProviderPort>) -> Self {
        Self {
            descriptor,
            adapter,
        }
    }
}

/// 编排器配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub params: GenerationParams,
    pub max_concurrent_requests: usize,
    pub retry: RetryPolicy,
    /// 是否合并同 key 的并发请求
    pub single_flight: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            params: GenerationParams::default(),
            max_concurrent_requests: 3,
            retry: RetryPolicy::default(),
            single_flight: true,
        }
    }
}

/// 生成编排器
///
/// 由调用方显式构造并持有，无全局状态
pub struct GenerationOrchestrator {
    params: GenerationParams,
    providers: Vec<RegisteredProvider>,
    cache: Arc<dyn AudioCachePort>,
    limiter: ConcurrencyLimiter,
    retry: RetryPolicy,
    in_flight: Option<SingleFlight<Outcome>>,
}

impl GenerationOrchestrator {
    /// 服务按 priority 升序排列，相同优先级保持注册顺序
    pub fn new(
        config: OrchestratorConfig,
        mut providers: Vec<RegisteredProvider>,
        cache: Arc<dyn AudioCachePort>,
    ) -> Self {
        providers.sort_by_key(|p| p.descriptor.priority);

        tracing::info!(
            providers = ?providers.iter().map(|p| p.descriptor.name.as_str()).collect::<Vec<_>>(),
            max_concurrent = config.max_concurrent_requests,
            single_flight = config.single_flight,
            "GenerationOrchestrator initialized"
        );

        Self {
            params: config.params,
            providers,
            cache,
            limiter: ConcurrencyLimiter::new(config.max_concurrent_requests),
            retry: config.retry,
            in_flight: config.single_flight.then(SingleFlight::new),
        }
    }

    /// 回退序列
    pub fn providers(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.providers.iter().map(|p| &p.descriptor)
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// 为氛围描述生成音频循环
    pub async fn generate(&self, ambiance: &str) -> Outcome {
        self.generate_with_cancel(ambiance, &CancellationToken::new())
            .await
    }

    /// 可取消的生成
    ///
    /// 取消时在当前挂起点（缓存 IO、等待槽位、HTTP、限流等待）放弃，槽位随 drop 释放
    pub async fn generate_with_cancel(&self, ambiance: &str, cancel: &CancellationToken) -> Outcome {
        let request = GenerationRequest::from_ambiance(ambiance, &self.params)?;
        let key = request.cache_key();
        let span = tracing::info_span!(
            "generate",
            generation_id = %Uuid::new_v4(),
            cache_key = %key
        );

        let work = async {
            match &self.in_flight {
                Some(flight) => {
                    let (outcome, leader) = flight
                        .run(key.as_str(), || self.resolve(&request, &key))
                        .await;
                    if !leader {
                        tracing::debug!("Joined in-flight generation");
                    }
                    outcome
                }
                None => self.resolve(&request, &key).await,
            }
        }
        .instrument(span);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(cache_key = %key, "Generation cancelled");
                Err(GenerationError::Cancelled)
            }
            outcome = work => outcome,
        }
    }

    async fn resolve(&self, request: &GenerationRequest, key: &CacheKey) -> Outcome {
        if let Some(entry) = self.cache.get(key).await {
            tracing::debug!("Cache hit");
            return Ok(GenerationResult::from_cache(entry));
        }

        self.generate_with_providers(request, key).await
    }

    async fn generate_with_providers(&self, request: &GenerationRequest, key: &CacheKey) -> Outcome {
        let mut last_error: Option<(String, ProviderError)> = None;

        for provider in &self.providers {
            let name = provider.descriptor.name.as_str();

            let Some(credentials) = provider.descriptor.credentials() else {
                let error = ProviderError::NotConfigured {
                    provider: name.to_uppercase(),
                };
                tracing::warn!(provider = %name, error = %error, "Skipping provider");
                last_error = Some((name.to_string(), error));
                continue;
            };

            tracing::info!(provider = %name, "Attempting to generate audio");
            let started = Instant::now();

            let outcome = {
                let _permit = self.limiter.acquire().await?;
                self.retry
                    .run(name, || provider.adapter.generate(request, &credentials))
                    .await
            };

            match outcome {
                Ok(audio) => {
                    let generation_time_ms = started.elapsed().as_millis() as u64;

                    if let Err(e) = self.cache.put(key, &audio.audio_data).await {
                        tracing::warn!(error = %e, "Failed to save audio to cache");
                    }

                    tracing::info!(
                        provider = %name,
                        generation_time_ms = generation_time_ms,
                        audio_size = audio.audio_data.len(),
                        "Successfully generated audio"
                    );

                    let mut metadata = audio.metadata;
                    if let Some(object) = metadata.as_object_mut() {
                        object.insert("source".to_string(), json!(name));
                        object.insert("source_url".to_string(), json!(audio.source_url));
                        object.insert("generation_time_ms".to_string(), json!(generation_time_ms));
                    }

                    return Ok(GenerationResult {
                        audio_data: audio.audio_data,
                        provider_used: name.to_string(),
                        generation_time_ms,
                        cache_hit: false,
                        cache_key: key.clone(),
                        metadata,
                    });
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "Failed to generate audio");
                    last_error = Some((name.to_string(), e));
                }
            }
        }

        match last_error {
            Some((provider, source)) => {
                tracing::error!(provider = %provider, error = %source, "All providers failed");
                Err(GenerationError::Provider { provider, source })
            }
            None => Err(GenerationError::NoProviders),
        }
    }
}

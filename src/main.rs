//! Ambiloop - 氛围循环音频生成服务

use std::sync::Arc;

use ambiloop::application::{AudioCachePort, GenerationOrchestrator, RegisteredProvider};
use ambiloop::config::{load_config, print_config, warn_missing_credentials, AppConfig};
use ambiloop::infrastructure::adapters::{build_provider, ProviderHttpClient};
use ambiloop::infrastructure::http::{AppState, HttpServer, ServerConfig};
use ambiloop::infrastructure::persistence::FileAudioCache;
use tokio_util::sync::CancellationToken;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},ambiloop={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Ambiloop - 氛围循环音频生成服务");
    print_config(&config);
    warn_missing_credentials(&config);

    // 文件缓存
    let audio_cache: Arc<dyn AudioCachePort> =
        Arc::new(FileAudioCache::new(&config.cache.file_cache_config()).await?);

    // 服务适配器共享一个 HTTP 客户端
    let http_client = ProviderHttpClient::new(&config.http.provider_http_config())?;
    let providers = config
        .provider_descriptors()?
        .into_iter()
        .map(|descriptor| {
            let adapter = build_provider(descriptor.kind, http_client.clone());
            RegisteredProvider::new(descriptor, adapter)
        })
        .collect();

    let orchestrator = Arc::new(GenerationOrchestrator::new(
        config.orchestrator_config(),
        providers,
        audio_cache.clone(),
    ));

    let shutdown = CancellationToken::new();
    let state = AppState::new(orchestrator, audio_cache, shutdown);
    let server = HttpServer::new(
        ServerConfig::new(&config.server.host, config.server.port),
        state,
    );

    tracing::info!("Starting HTTP server...");

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

use anyhow::{Context, Result};
use std::sync::Arc;

use recipe_lens::config::Config;
use recipe_lens::handlers::AnalyzeHandler;
use recipe_lens::server::{create_router, ANALYZE_PATH};
use recipe_lens::services::OpenAiVisionService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting recipe bridge...");

    // Load configuration (.env first, then the process environment)
    let config = Config::from_env()?;
    log::debug!("⚙️ {:?}", config);

    if config.api_key.is_none() {
        log::warn!("⚠️ OPENAI_KEY not set, analysis requests will fail until it is configured");
    }

    let service = OpenAiVisionService::from_config(&config)
        .context("Failed to initialize OpenAI service")?;
    log::info!(
        "✅ OpenAI service initialized (timeout {}s)",
        config.timeout.as_secs()
    );

    let analyze_handler = Arc::new(AnalyzeHandler::new(Arc::new(service)));
    let app = create_router(analyze_handler, &config.assets_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    log::info!("🌐 Server listening on {}", config.bind_addr);
    log::info!("🍽️ Upload page: http://{}/", config.bind_addr);
    log::info!("📮 Bridge endpoint: POST {}", ANALYZE_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("🛑 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
    }
    log::info!("🛑 Shutting down...");
}

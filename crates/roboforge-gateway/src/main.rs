//! RoboForge Gateway: proxies design and image generation to Gemini.
//! The API key stays on the server; clients only see `/api/*`.

mod config;
mod error;
mod gemini;
mod handlers;

use std::sync::Arc;

use roboforge_core::ResultNormalizer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::GatewayConfig;
use crate::gemini::GeminiClient;
use crate::handlers::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("[Server] Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let gemini = GeminiClient::new(&config);
    if !gemini.has_credential() {
        tracing::warn!("[Server] API_KEY is not set; generation endpoints will return 500");
    }

    let state = Arc::new(AppState {
        gemini: Arc::new(gemini),
        normalizer: Arc::new(ResultNormalizer::default()),
    });
    let app = handlers::router(state, config.static_dir.as_deref());

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("[Server] Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("[Server] RoboForge gateway v{}", roboforge_core::version());
    tracing::info!("Server running on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("[Server] Server error: {}", e);
        std::process::exit(1);
    }
}

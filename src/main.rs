//! Document Parser - multi-format document parsing gateway.

mod api;
mod config;
mod dispatcher;
mod engines;
mod error;
mod handlers;
mod ocr;
mod schema;
mod sheet_parser;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

use api::AppState;
use config::ServiceConfig;
use dispatcher::Registry;
use engines::Engines;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "document_parser=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ServiceConfig::load()?;
    info!("Configuration: {:?}", config);

    // Resolve OCR language data once for the whole process
    let tessdata = ocr::resolve_datapath(config.tessdata_path.as_deref());

    let engines = Engines::from_config(&config, tessdata);
    let registry = Registry::standard(&engines);
    info!("Registered handlers: {:?}", registry.handler_names());

    let state = AppState {
        registry: Arc::new(registry),
    };
    let app = api::router(state, config.max_upload_bytes);

    // Run server
    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

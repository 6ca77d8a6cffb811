//! Theme Weaver server binary
//!
//! Run with: cargo run -p theme-weaver --bin theme-weaver-server [config.toml]

use std::path::PathBuf;

use theme_weaver::{config::AppConfig, server::ThemeWeaverServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "theme_weaver=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var("THEME_WEAVER_CONFIG").ok().map(PathBuf::from));

    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Data dir: {}", config.storage.data_dir.display());
    tracing::info!("  - Store: {}", config.storage.store_path.display());
    tracing::info!(
        "  - OCR: {} ({}), PDF fallback: {}",
        config.extraction.tesseract_cmd,
        config.extraction.ocr_language,
        config.extraction.pdf_ocr_fallback
    );

    let server = ThemeWeaverServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/documents/upload      - Upload documents");
    println!("  GET  /api/query/query_documents - Ask a question per document");
    println!("  POST /api/themes/analyze        - Identify themes");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}

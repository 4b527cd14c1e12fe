use anyhow::{Context, Result};
use pdfchat::{
    api::{self, AppState},
    config, logging,
    extraction::PdfTextExtractor,
    model::{AnthropicClient, AnthropicSettings},
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    config::init_config().context("failed to load configuration")?;
    let config = config::get_config();

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;

    let model = AnthropicClient::new(AnthropicSettings::from(config))
        .context("failed to build model client")?;
    let state = Arc::new(AppState::new(
        Arc::new(model),
        Arc::new(PdfTextExtractor),
        config.upload_dir.clone(),
    ));
    let app = api::create_router(state, &config.public_dir, config.upload_max_bytes);

    let listener = bind_listener(config.server_port).await?;
    tracing::info!("PDF chat is running at http://localhost:{}", config.server_port);
    tracing::info!(
        public_dir = %config.public_dir.display(),
        model = %config.anthropic_model,
        "Upload a PDF, then ask questions about it"
    );
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn bind_listener(port: u16) -> Result<TcpListener> {
    use std::net::Ipv4Addr;

    TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{port}"))
}

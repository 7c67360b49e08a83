use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nosql_sanitize::{api::create_router, Config, ParamHandler, SanitizeLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env();
    config.validate().map_err(anyhow::Error::msg)?;

    // Initialize tracing with structured logging; RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting nosql_sanitize demo server");

    let options = config.load_options().map_err(|e| {
        tracing::error!("Failed to load sanitizer options: {}", e);
        e
    })?;
    info!(
        mode = ?options.mode(),
        sections = ?options.sanitize_objects(),
        "Sanitizer options resolved"
    );

    let sanitize = SanitizeLayer::new(options.clone()).with_body_limit(config.body_limit_bytes);
    let params = ParamHandler::new(options);

    let app = create_router(sanitize, params)
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

    // Start server
    info!("Listening on {}", config.listen_addr);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

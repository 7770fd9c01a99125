use product_advisor::{
    api::{create_router, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product_advisor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::debug!(config = ?config, "Loaded configuration");

    if config.api_key().is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; advise requests will fail until it is configured");
    }

    // Initialize application state
    let state = AppState::from_config(&config)?;
    tracing::info!(
        products = state.catalog().len(),
        model = %config.gemini_model,
        "Advisor ready"
    );

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

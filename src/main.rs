use taste_api::{config::Config, routes::create_router, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taste_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let state = AppState::new(&config);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "taste-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}

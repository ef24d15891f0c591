use reelrec::{
    api::{create_router, AppState},
    config::Config,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelrec=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Initialize application state; a broken catalog aborts here
    let state = AppState::from_config(&config).await?;
    let shutdown = state.shutdown.clone();

    // Log rating changes as they happen
    let mut rating_events = state.ratings.subscribe();
    tokio::spawn(async move {
        loop {
            match rating_events.recv().await {
                Ok(event) => tracing::debug!(?event, "Rating changed"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Rating event log fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Server running");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

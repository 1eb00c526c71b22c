use anyhow::Result;
use crawlhub_core::events::ShutdownReason;
use crawlhub_core::{app::AppState, http, observability};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init();

    let state = AppState::bootstrap(None);
    let bus = state.bus.clone();
    let crawl_engine = state.crawl_engine.clone();
    let router = http::router(state);

    let addr = std::env::var("CRAWLHUB_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "crawlhub listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    crawl_engine.shutdown().await;
    bus.shutdown_gracefully(ShutdownReason::Cancelled).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

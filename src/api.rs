use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};

pub mod routes;
pub mod state;

use crate::{config::store::StudyModeConfig, limiter::RateLimiter};
use routes::{chat_handler, fallback_handler, health_handler};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/chat", post(chat_handler).fallback(fallback_handler))
        .route("/api/health", get(health_handler).fallback(fallback_handler))
        .fallback(fallback_handler)
        .layer(cors)
        .with_state(state)
}

pub async fn serve(config: StudyModeConfig) -> anyhow::Result<()> {
    log::info!("initializing state...");
    let state = AppState::new(config)?;

    spawn_cleanup(
        state.chat.limiter().clone(),
        state.config.rate_limit.cleanup_interval_secs,
    );

    let address = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&address).await?;
    log::info!(
        "study mode api listening on {address} (provider: {}, content: {})",
        state.chat.model_name(),
        state.config.content_root().display()
    );

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    log::info!("server shut down");

    Ok(())
}

/// Drops expired rate-limit entries every `interval_secs`; zero disables it.
fn spawn_cleanup(limiter: Arc<RateLimiter>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.cleanup().await;
            if removed > 0 {
                log::debug!("rate limiter cleanup removed {removed} expired entries");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => log::info!("received ctrl+c, shutting down"),
            Err(why) => {
                log::error!("failed to install ctrl+c handler: {why}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("received terminate signal, shutting down");
            }
            Err(why) => {
                log::error!("failed to install signal handler: {why}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

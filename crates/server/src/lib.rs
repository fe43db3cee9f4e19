//! Image upload proxy.
//!
//! Accepts images over multipart, forwards each one to the configured vision
//! provider and relays the text back. Nothing is stored.
//!
//! | Route | Body | Reply |
//! |---|---|---|
//! | `POST /api/analyze-image` | `image`, optional `prompt` | `{success, analysis, filename, size}` |
//! | `POST /api/analyze-images` | `images` (up to `MAX_FILES`), optional `prompt` | `{success, results: [{filename, analysis, size}], totalImages}` |
//! | `GET /api/health` | | `{status, timestamp}` |
//!
//! Non-image uploads, missing files and too many files are rejected with 400
//! before the provider is called; a file above `MAX_FILE_BYTES` gets 413 as
//! soon as the running total passes the cap.
//! Provider failures become 500 with `{error, details}`.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::ServerConfig;
use routes::{analyze_image, analyze_images, health};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let single_limit = DefaultBodyLimit::max(state.config.single_body_limit());
    let batch_limit = DefaultBodyLimit::max(state.config.batch_body_limit());

    Router::new()
        .route("/api/analyze-image", post(analyze_image).layer(single_limit))
        .route("/api/analyze-images", post(analyze_images).layer(batch_limit))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    info!("Initializing state...");
    let state = AppState::new(config)?;
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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

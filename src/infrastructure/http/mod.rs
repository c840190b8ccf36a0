pub mod request_id;

use axum::{middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::controllers::{audio::AudioController, health};
use crate::error::AppError;
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// All routes, without binding a listener
pub fn build_router(audio_controller: Arc<AudioController>) -> Router {
    let audio_routes = Router::new()
        .route("/api/audio/story", post(AudioController::make_story_audio))
        .route("/health/ready", get(AudioController::health_ready))
        .with_state(audio_controller);

    Router::new()
        .route("/health", get(health::health))
        .merge(audio_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    audio_controller: Arc<AudioController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(audio_controller);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::Arc;

use axum::{routing::get, Router};

use tweetrewind_archive::Archive;

pub mod rest;

pub struct AppState {
    pub archive: Archive,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // REST API
        .route("/api/tweets/{username}", get(rest::api_tweets))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

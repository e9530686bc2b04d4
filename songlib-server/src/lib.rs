//! songlib-server library
//!
//! Song catalog service: songs are created from `(group, title)`, enriched by
//! a metadata resolver, stored with their verses in SQLite and served over a
//! JSON HTTP API.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

use services::SongLifecycle;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<SongLifecycle>,
    /// Upper bound for a single request
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(lifecycle: SongLifecycle, request_timeout: Duration) -> Self {
        Self {
            lifecycle: Arc::new(lifecycle),
            request_timeout,
        }
    }
}

/// Build application router
///
/// Song routes live under `/api`; `/health` sits at the root.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let song_routes = Router::new()
        .route("/song", get(api::list_songs).post(api::create_song))
        .route(
            "/song/:id",
            get(api::get_song).put(api::update_song).delete(api::delete_song),
        )
        .route("/verses/:id", get(api::get_verses));

    let timeout = state.request_timeout;

    Router::new()
        .nest("/api", song_routes)
        .merge(api::health_routes())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod runs;
pub mod workflows;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use engine::RunController;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RunController>,
}

impl AppState {
    pub fn new(controller: Arc<RunController>) -> Self {
        Self { controller }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/workflows",
            post(workflows::create).get(workflows::list),
        )
        .route("/api/v1/workflows/:id", get(workflows::get))
        .route("/api/v1/workflows/:id/runs", post(runs::start))
        .route("/api/v1/runs/:id", get(runs::status))
        .route("/api/v1/runs/:id/cancel", post(runs::cancel))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

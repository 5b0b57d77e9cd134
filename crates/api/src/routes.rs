use axum::{
    routing::{get, post},
    Router,
};
use crate::{handlers::*, middleware::apply_middleware, AppState};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Reference codes for clients
        .route("/", get(get_mappings))
        // Scoring
        .route("/predict", post(predict_risk))
        // Health and metrics
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
}

pub fn build_router(state: AppState) -> Router {
    let server = state.config.server.clone();
    apply_middleware(create_router(), &server).with_state(state)
}

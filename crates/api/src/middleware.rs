use axum::{extract::DefaultBodyLimit, Router};
use credit_models::ServerConfig;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// Request tracing, permissive CORS for browser frontends, and the
/// configured body size cap.
pub fn apply_middleware(router: Router<AppState>, server: &ServerConfig) -> Router<AppState> {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(server.max_request_body_size_kb * 1024)),
    )
}

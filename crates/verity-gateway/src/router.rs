//! Axum router wiring.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport::http};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/compliance/:user", get(http::is_compliant))
        .route("/v1/compliance/:user/:jurisdiction", get(http::is_compliant_in))
        .route("/v1/modules/count", get(http::module_count))
        .route("/v1/modules/general", post(http::register_general))
        .route("/v1/modules/jurisdiction", post(http::register_jurisdiction))
        .route("/v1/modules/:address", delete(http::remove_module))
        .route("/v1/events", get(http::events))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}

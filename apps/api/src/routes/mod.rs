pub mod health;
pub mod password;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::receipt::handlers;
use crate::state::AppState;

/// Upper bound for a render form: receipt JSON plus a phone-camera logo.
const MAX_FORM_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let receipts = Router::new()
        .route("/api/v1/receipts/profile", get(handlers::handle_get_profile))
        .route("/api/v1/receipts/render", post(handlers::handle_render))
        .route("/api/v1/receipts/preview", post(handlers::handle_preview))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            password::require_app_password,
        ))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(receipts)
        .with_state(state)
}

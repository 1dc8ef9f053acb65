use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

pub const PASSWORD_HEADER: &str = "x-app-password";

/// Rejects receipt requests that do not carry the configured shared password.
/// A no-op when `APP_PASSWORD` is unset.
pub async fn require_app_password(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.app_password.as_deref() {
        let supplied = request
            .headers()
            .get(PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok());
        if supplied != Some(expected) {
            warn!(path = %request.uri().path(), "Rejected request with missing or wrong password");
            return Err(AppError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

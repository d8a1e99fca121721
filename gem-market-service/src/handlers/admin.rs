use axum::{extract::State, http::HeaderMap, Json};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::utils::constant_time_eq;

use crate::dtos::AdminSessionResponse;
use crate::middleware::ADMIN_SECRET_HEADER;
use crate::startup::AppState;

/// Exchange the shared admin secret for a bearer token.
#[tracing::instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdminSessionResponse>, AppError> {
    let presented = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if presented.is_empty()
        || !constant_time_eq(presented, state.config.admin.secret.expose_secret())
    {
        tracing::warn!("Rejected admin session request");
        return Err(AppError::AuthError(anyhow::anyhow!("Invalid admin secret")));
    }

    let token = state.sessions.issue()?;
    tracing::info!("Admin session issued");

    Ok(Json(AdminSessionResponse {
        success: true,
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.sessions.ttl_seconds(),
    }))
}

use axum::{extract::State, http::header, response::IntoResponse};
use service_core::error::AppError;

use crate::services::storage::content_type_for;
use crate::startup::AppState;
use crate::utils::ApiPath;

/// Stream back a stored slip or gemstone image.
pub async fn serve_upload(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<impl IntoResponse, AppError> {
    if key.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(AppError::bad_request("Invalid file path"));
    }

    let data = state.storage.download(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&key)),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        data,
    ))
}

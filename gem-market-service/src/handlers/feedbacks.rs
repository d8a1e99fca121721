use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use service_core::error::AppError;

use super::{find_or_404, save};
use crate::dtos::{
    CreateFeedbackRequest, FeedbackEnvelope, FeedbackListParams, FeedbackListResponse,
    MessageResponse, UpdateFeedbackRequest,
};
use crate::middleware::Requester;
use crate::models::{normalize_email, Feedback};
use crate::services::Filter;
use crate::startup::AppState;
use crate::utils::{ApiPath, ApiQuery, ValidatedJson};

pub async fn create_feedback(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackEnvelope>), AppError> {
    let feedback = Feedback::new(
        req.name.trim().to_string(),
        normalize_email(&req.email),
        req.message.trim().to_string(),
        req.rating,
    );
    state.repos.feedbacks.insert(&feedback).await?;
    tracing::info!(feedback_id = %feedback.id, rating = feedback.rating, "Feedback received");

    Ok((StatusCode::CREATED, Json(FeedbackEnvelope::from(feedback))))
}

pub async fn list_feedbacks(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FeedbackListParams>,
) -> Result<Json<FeedbackListResponse>, AppError> {
    let feedbacks = state
        .repos
        .feedbacks
        .find(Filter::new().eq_opt("rating", params.rating))
        .await?;
    Ok(Json(FeedbackListResponse::from(feedbacks)))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<FeedbackEnvelope>, AppError> {
    let feedback = find_or_404(state.repos.feedbacks.as_ref(), &id, "Feedback").await?;
    Ok(Json(FeedbackEnvelope::from(feedback)))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackEnvelope>, AppError> {
    let mut feedback = find_or_404(state.repos.feedbacks.as_ref(), &id, "Feedback").await?;
    requester.ensure_can_manage(&feedback.email)?;

    if let Some(name) = req.name {
        feedback.name = name.trim().to_string();
    }
    if let Some(message) = req.message {
        feedback.message = message.trim().to_string();
    }
    if let Some(rating) = req.rating {
        feedback.rating = rating;
    }
    feedback.updated_at = Utc::now();
    save(state.repos.feedbacks.as_ref(), &feedback, "Feedback").await?;

    Ok(Json(FeedbackEnvelope::from(feedback)))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let feedback = find_or_404(state.repos.feedbacks.as_ref(), &id, "Feedback").await?;
    requester.ensure_can_manage(&feedback.email)?;

    if !state.repos.feedbacks.delete(&feedback.id).await? {
        return Err(AppError::not_found("Feedback not found"));
    }
    Ok(Json(MessageResponse::new("Feedback deleted")))
}

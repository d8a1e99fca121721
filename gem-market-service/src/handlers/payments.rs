//! Bank-deposit payments: the payer uploads a slip, an admin settles it.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::ValidateEmail;

use super::{find_or_404, parse_opt, save};
use crate::dtos::{
    MessageResponse, PaymentEnvelope, PaymentListParams, PaymentListResponse,
    UpdatePaymentStatusRequest,
};
use crate::middleware::{AdminOnly, Requester};
use crate::models::{normalize_email, Payment, PaymentStatus};
use crate::services::{metrics, Filter};
use crate::startup::AppState;
use crate::utils::{ApiPath, ApiQuery, MultipartForm, ValidatedJson};

const SLIP_FIELD: &str = "slip";

#[tracing::instrument(skip_all)]
pub async fn create_payment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PaymentEnvelope>), AppError> {
    let mut form = MultipartForm::collect(multipart, state.config.storage.max_upload_bytes).await?;

    let email = normalize_email(&form.required_text("email")?);
    if !email.validate_email() {
        return Err(AppError::bad_request("A valid email is required"));
    }
    let name = form.required_text("name")?;
    let amount = form.required_positive("amount")?;
    let bank = form.required_text("bank")?;
    let branch = form.required_text("branch")?;
    let remarks = form.text("remarks");

    let slip = form
        .take_files(SLIP_FIELD)
        .into_iter()
        .next()
        .ok_or_else(|| AppError::bad_request("slip file is required"))?;
    if !(slip.is_image() || slip.is_pdf()) {
        return Err(AppError::bad_request("slip must be an image or PDF"));
    }

    let slip_key = format!("payments/{}.{}", Uuid::new_v4(), slip.extension());
    state.storage.upload(&slip_key, slip.data).await.map_err(|e| {
        tracing::error!("Failed to store payment slip {}: {}", slip_key, e);
        e
    })?;

    let payment = Payment::new(email, name, amount, bank, branch, slip_key, remarks);

    if let Err(e) = state.repos.payments.insert(&payment).await {
        if let Err(cleanup) = state.storage.delete(&payment.slip_key).await {
            tracing::warn!("Failed to remove orphaned slip {}: {}", payment.slip_key, cleanup);
        }
        return Err(e);
    }

    metrics::record_payment_event("bank", payment.status.as_str());
    tracing::info!(payment_id = %payment.id, amount = payment.amount, "Bank payment submitted");

    Ok((StatusCode::CREATED, Json(PaymentEnvelope::from(payment))))
}

pub async fn list_payments(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(params): ApiQuery<PaymentListParams>,
) -> Result<Json<PaymentListResponse>, AppError> {
    let status = parse_opt::<PaymentStatus>(params.status.as_deref())?;
    let mut filter = Filter::new().eq_opt("status", status.map(|s| s.as_str()));

    if requester.is_admin {
        filter = filter
            .eq("deleted_by_admin", false)
            .eq_opt("email", params.email.as_deref().map(normalize_email));
    } else {
        match requester.listing_email(params.email.as_deref()) {
            Some(email) => {
                filter = filter.eq("email", email).eq("deleted_by_user", false);
            }
            None => return Ok(Json(PaymentListResponse::from(Vec::new()))),
        }
    }

    let payments = state.repos.payments.find(filter).await?;
    Ok(Json(PaymentListResponse::from(payments)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<PaymentEnvelope>, AppError> {
    let payment = find_or_404(state.repos.payments.as_ref(), &id, "Payment").await?;
    requester.ensure_can_manage(&payment.email)?;
    Ok(Json(PaymentEnvelope::from(payment)))
}

#[tracing::instrument(skip(state, _admin, req))]
pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdatePaymentStatusRequest>,
) -> Result<Json<PaymentEnvelope>, AppError> {
    let target: PaymentStatus = req.status.parse().map_err(AppError::bad_request)?;

    let mut payment = find_or_404(state.repos.payments.as_ref(), &id, "Payment").await?;
    payment.settle(target)?;
    if let Some(remarks) = req.remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()) {
        payment.remarks = Some(remarks);
    }
    save(state.repos.payments.as_ref(), &payment, "Payment").await?;

    metrics::record_payment_event("bank", target.as_str());
    tracing::info!(payment_id = %payment.id, status = target.as_str(), "Bank payment settled");

    Ok(Json(PaymentEnvelope::from(payment)))
}

/// Hide a payment from the caller's own listing without deleting it.
pub async fn hide_payment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut payment = find_or_404(state.repos.payments.as_ref(), &id, "Payment").await?;
    requester.ensure_can_manage(&payment.email)?;

    if requester.is_admin {
        payment.deleted_by_admin = true;
    } else {
        payment.deleted_by_user = true;
    }
    payment.updated_at = chrono::Utc::now();
    save(state.repos.payments.as_ref(), &payment, "Payment").await?;

    Ok(Json(MessageResponse::new("Payment hidden")))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let payment = find_or_404(state.repos.payments.as_ref(), &id, "Payment").await?;
    requester.ensure_can_manage(&payment.email)?;

    if !state.repos.payments.delete(&payment.id).await? {
        return Err(AppError::not_found("Payment not found"));
    }
    if let Err(e) = state.storage.delete(&payment.slip_key).await {
        tracing::warn!("Failed to remove slip {}: {}", payment.slip_key, e);
    }
    tracing::info!(payment_id = %payment.id, "Bank payment deleted");

    Ok(Json(MessageResponse::new("Payment deleted")))
}

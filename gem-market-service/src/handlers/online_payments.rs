//! Card payments confirmed with a one-time code.
//!
//! Create validates the card, stores only its masked form and sends a code.
//! Verify moves the payment to `completed`, or to `failed` once the code
//! expires or too many wrong codes were tried.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use service_core::error::AppError;

use super::{find_or_404, parse_opt, save};
use crate::dtos::{
    CreateOnlinePaymentRequest, MessageResponse, OnlinePaymentEnvelope,
    OnlinePaymentListParams, OnlinePaymentListResponse, OtpResentResponse, OtpVerifiedResponse,
    VerifyOtpRequest,
};
use crate::middleware::{AdminOnly, Requester};
use crate::models::{
    normalize_email, OnlinePayment, OnlinePaymentStatus, OnlinePaymentType, OtpOutcome,
};
use crate::models::online_payment::NewOnlinePayment;
use crate::services::otp::{generate_otp, hash_otp, OTP_LENGTH};
use crate::services::{metrics, Filter};
use crate::startup::AppState;
use crate::utils::{validate_card, ApiPath, ApiQuery, ValidatedJson};

fn otp_ttl(state: &AppState) -> Duration {
    Duration::seconds(state.config.otp.ttl_seconds)
}

fn exposed_code(state: &AppState, code: String) -> Option<String> {
    state.config.otp.expose_in_response.then_some(code)
}

#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn create_payment(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateOnlinePaymentRequest>,
) -> Result<(StatusCode, Json<OnlinePaymentEnvelope>), AppError> {
    let payment_type: OnlinePaymentType =
        req.payment_type.parse().map_err(AppError::bad_request)?;
    let card = validate_card(
        &req.card_number,
        &req.expiry_date,
        &req.cvv,
        Utc::now().date_naive(),
    )?;

    let code = generate_otp(OTP_LENGTH);
    let payment = OnlinePayment::new(
        NewOnlinePayment {
            email: normalize_email(&req.email),
            amount: req.amount,
            payment_type,
            card_holder_name: req.card_holder_name.trim().to_string(),
            card_brand: card.brand,
            card_last4: card.last4,
            card_expiry: card.expiry,
        },
        hash_otp(&code),
        otp_ttl(&state),
    );

    state.repos.online_payments.insert(&payment).await?;
    state
        .otp_notifier
        .deliver(&payment.email, &payment.id, &code)
        .await
        .map_err(|e| {
            tracing::error!(payment_id = %payment.id, "Failed to deliver OTP: {}", e);
            e
        })?;

    metrics::record_payment_event("online", payment.status.as_str());
    tracing::info!(payment_id = %payment.id, amount = payment.amount, "Online payment initiated");

    let mut envelope = OnlinePaymentEnvelope::from(payment);
    envelope.dev_otp = exposed_code(&state, code);

    Ok((StatusCode::CREATED, Json(envelope)))
}

#[tracing::instrument(skip(state, req))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<OtpVerifiedResponse>, AppError> {
    let repo = state.repos.online_payments.as_ref();
    let mut payment = find_or_404(repo, &id, "Payment").await?;

    let outcome = payment.verify_otp(
        &hash_otp(&req.otp),
        Utc::now(),
        state.config.otp.max_attempts,
    );

    if outcome != OtpOutcome::NotPending {
        save(repo, &payment, "Payment").await?;
    }

    match outcome {
        OtpOutcome::Verified => {
            metrics::record_otp_verification("verified");
            metrics::record_payment_event("online", payment.status.as_str());
            tracing::info!(payment_id = %payment.id, "Online payment verified");
            Ok(Json(OtpVerifiedResponse {
                success: true,
                message: "Payment completed".to_string(),
                payment: payment.into(),
            }))
        }
        OtpOutcome::Invalid { remaining_attempts } => {
            metrics::record_otp_verification("invalid");
            tracing::warn!(payment_id = %payment.id, remaining_attempts, "Invalid OTP submitted");
            Err(AppError::bad_request(format!(
                "Invalid OTP. {} attempt(s) remaining",
                remaining_attempts
            )))
        }
        OtpOutcome::Expired => {
            metrics::record_otp_verification("expired");
            metrics::record_payment_event("online", payment.status.as_str());
            Err(AppError::bad_request("OTP has expired. Please start a new payment"))
        }
        OtpOutcome::Locked => {
            metrics::record_otp_verification("locked");
            metrics::record_payment_event("online", payment.status.as_str());
            tracing::warn!(payment_id = %payment.id, "Online payment locked after failed attempts");
            Err(AppError::bad_request(
                "Too many incorrect attempts. The payment has been locked",
            ))
        }
        OtpOutcome::NotPending => Err(AppError::conflict(format!(
            "Payment is already {}",
            payment.status.as_str()
        ))),
    }
}

#[tracing::instrument(skip(state))]
pub async fn resend_otp(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<OtpResentResponse>, AppError> {
    let repo = state.repos.online_payments.as_ref();
    let mut payment = find_or_404(repo, &id, "Payment").await?;

    let code = generate_otp(OTP_LENGTH);
    if !payment.reissue_otp(hash_otp(&code), otp_ttl(&state)) {
        return Err(AppError::conflict(format!(
            "Payment is already {}",
            payment.status.as_str()
        )));
    }
    save(repo, &payment, "Payment").await?;

    state
        .otp_notifier
        .deliver(&payment.email, &payment.id, &code)
        .await?;
    tracing::info!(payment_id = %payment.id, "OTP reissued");

    Ok(Json(OtpResentResponse {
        success: true,
        message: "A new OTP has been sent".to_string(),
        otp_expires_at: payment.otp_expires_at.to_rfc3339(),
        dev_otp: exposed_code(&state, code),
    }))
}

pub async fn list_payments(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(params): ApiQuery<OnlinePaymentListParams>,
) -> Result<Json<OnlinePaymentListResponse>, AppError> {
    let status = parse_opt::<OnlinePaymentStatus>(params.status.as_deref())?;
    let mut filter = Filter::new().eq_opt("status", status.map(|s| s.as_str()));

    if requester.is_admin {
        filter = filter.eq_opt("email", params.email.as_deref().map(normalize_email));
    } else {
        match requester.listing_email(params.email.as_deref()) {
            Some(email) => filter = filter.eq("email", email),
            None => return Ok(Json(OnlinePaymentListResponse::from(Vec::new()))),
        }
    }

    let payments = state.repos.online_payments.find(filter).await?;
    Ok(Json(OnlinePaymentListResponse::from(payments)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<OnlinePaymentEnvelope>, AppError> {
    let payment = find_or_404(state.repos.online_payments.as_ref(), &id, "Payment").await?;
    requester.ensure_can_manage(&payment.email)?;
    Ok(Json(OnlinePaymentEnvelope::from(payment)))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.repos.online_payments.delete(&id).await? {
        return Err(AppError::not_found("Payment not found"));
    }
    tracing::info!(payment_id = %id, "Online payment deleted");

    Ok(Json(MessageResponse::new("Payment deleted")))
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{CardBrand, OnlinePayment, OnlinePaymentStatus, OnlinePaymentType, OtpStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOnlinePaymentRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "amount must be greater than zero"))]
    pub amount: f64,
    #[serde(default)]
    #[validate(length(min = 1, message = "paymentType is required"))]
    pub payment_type: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "cardHolderName is required"))]
    pub card_holder_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "cardNumber is required"))]
    pub card_number: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "expiryDate is required"))]
    pub expiry_date: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "cvv is required"))]
    pub cvv: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "otp is required"))]
    pub otp: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OnlinePaymentListParams {
    pub status: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePaymentResponse {
    pub id: String,
    pub email: String,
    pub amount: f64,
    pub payment_type: OnlinePaymentType,
    pub card_holder_name: String,
    pub card_brand: CardBrand,
    pub masked_card: String,
    pub card_expiry: String,
    pub status: OnlinePaymentStatus,
    pub otp_status: OtpStatus,
    pub otp_expires_at: String,
    pub otp_attempts: i32,
    pub verified_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OnlinePayment> for OnlinePaymentResponse {
    fn from(payment: OnlinePayment) -> Self {
        Self {
            masked_card: format!("**** **** **** {}", payment.card_last4),
            id: payment.id,
            email: payment.email,
            amount: payment.amount,
            payment_type: payment.payment_type,
            card_holder_name: payment.card_holder_name,
            card_brand: payment.card_brand,
            card_expiry: payment.card_expiry,
            status: payment.status,
            otp_status: payment.otp_status,
            otp_expires_at: payment.otp_expires_at.to_rfc3339(),
            otp_attempts: payment.otp_attempts,
            verified_at: payment.verified_at.map(|t| t.to_rfc3339()),
            created_at: payment.created_at.to_rfc3339(),
            updated_at: payment.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePaymentEnvelope {
    pub success: bool,
    pub payment: OnlinePaymentResponse,
    /// Only populated when codes are exposed for local development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_otp: Option<String>,
}

impl From<OnlinePayment> for OnlinePaymentEnvelope {
    fn from(payment: OnlinePayment) -> Self {
        Self {
            success: true,
            payment: payment.into(),
            dev_otp: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifiedResponse {
    pub success: bool,
    pub message: String,
    pub payment: OnlinePaymentResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResentResponse {
    pub success: bool,
    pub message: String,
    pub otp_expires_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OnlinePaymentListResponse {
    pub success: bool,
    pub count: usize,
    pub payments: Vec<OnlinePaymentResponse>,
}

impl From<Vec<OnlinePayment>> for OnlinePaymentListResponse {
    fn from(payments: Vec<OnlinePayment>) -> Self {
        Self {
            success: true,
            count: payments.len(),
            payments: payments.into_iter().map(Into::into).collect(),
        }
    }
}

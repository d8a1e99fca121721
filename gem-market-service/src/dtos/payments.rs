use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Payment, PaymentStatus};

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListParams {
    pub status: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentStatusRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub amount: f64,
    pub bank: String,
    pub branch: String,
    pub slip_url: String,
    pub remarks: Option<String>,
    pub status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            email: payment.email,
            name: payment.name,
            amount: payment.amount,
            bank: payment.bank,
            branch: payment.branch,
            slip_url: payment.slip_url,
            remarks: payment.remarks,
            status: payment.status,
            created_at: payment.created_at.to_rfc3339(),
            updated_at: payment.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentEnvelope {
    pub success: bool,
    pub payment: PaymentResponse,
}

impl From<Payment> for PaymentEnvelope {
    fn from(payment: Payment) -> Self {
        Self {
            success: true,
            payment: payment.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub success: bool,
    pub count: usize,
    pub payments: Vec<PaymentResponse>,
}

impl From<Vec<Payment>> for PaymentListResponse {
    fn from(payments: Vec<Payment>) -> Self {
        Self {
            success: true,
            count: payments.len(),
            payments: payments.into_iter().map(Into::into).collect(),
        }
    }
}

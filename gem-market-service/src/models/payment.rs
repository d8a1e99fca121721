use crate::services::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failure,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failure => "failure",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "failure" => Ok(PaymentStatus::Failure),
            _ => Err(format!(
                "Invalid status '{}'. Expected one of: pending, success, failure",
                s
            )),
        }
    }
}

/// A bank-deposit payment backed by an uploaded slip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub amount: f64,
    pub bank: String,
    pub branch: String,
    pub slip_url: String,
    pub slip_key: String,
    pub remarks: Option<String>,
    pub status: PaymentStatus,
    pub deleted_by_user: bool,
    pub deleted_by_admin: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        email: String,
        name: String,
        amount: f64,
        bank: String,
        branch: String,
        slip_key: String,
        remarks: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            amount,
            bank,
            branch,
            slip_url: format!("/uploads/{}", slip_key),
            slip_key,
            remarks,
            status: PaymentStatus::Pending,
            deleted_by_user: false,
            deleted_by_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Settle a pending payment. Only `pending → success | failure` is allowed.
    pub fn settle(&mut self, target: PaymentStatus) -> Result<(), AppError> {
        if target == PaymentStatus::Pending {
            return Err(AppError::bad_request(
                "Status must be either 'success' or 'failure'",
            ));
        }
        if self.status != PaymentStatus::Pending {
            return Err(AppError::conflict(format!(
                "Payment has already been marked as {}",
                self.status.as_str()
            )));
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

impl Entity for Payment {
    const COLLECTION: &'static str = "payments";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

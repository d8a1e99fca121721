use crate::services::repository::Entity;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use service_core::utils::constant_time_eq;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnlinePaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl OnlinePaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnlinePaymentStatus::Pending => "pending",
            OnlinePaymentStatus::Completed => "completed",
            OnlinePaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for OnlinePaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OnlinePaymentStatus::Pending),
            "completed" => Ok(OnlinePaymentStatus::Completed),
            "failed" => Ok(OnlinePaymentStatus::Failed),
            _ => Err(format!(
                "Invalid status '{}'. Expected one of: pending, completed, failed",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
    Locked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnlinePaymentType {
    Registration,
    AuctionDeposit,
    BidSettlement,
}

impl FromStr for OnlinePaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "registration" => Ok(OnlinePaymentType::Registration),
            "auction_deposit" => Ok(OnlinePaymentType::AuctionDeposit),
            "bid_settlement" => Ok(OnlinePaymentType::BidSettlement),
            _ => Err(format!(
                "Invalid payment type '{}'. Expected one of: registration, auction_deposit, bid_settlement",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    /// Detect the brand from the leading digits of a card number.
    pub fn detect(digits: &str) -> Self {
        let prefix2: u32 = digits.get(..2).and_then(|p| p.parse().ok()).unwrap_or(0);
        let prefix4: u32 = digits.get(..4).and_then(|p| p.parse().ok()).unwrap_or(0);

        if digits.starts_with('4') {
            CardBrand::Visa
        } else if (51..=55).contains(&prefix2) || (2221..=2720).contains(&prefix4) {
            CardBrand::Mastercard
        } else if prefix2 == 34 || prefix2 == 37 {
            CardBrand::Amex
        } else if digits.starts_with("6011") || prefix2 == 65 {
            CardBrand::Discover
        } else {
            CardBrand::Unknown
        }
    }
}

/// Result of checking a submitted OTP against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Verified,
    Invalid { remaining_attempts: i32 },
    Expired,
    Locked,
    NotPending,
}

/// A card payment confirmed with a one-time code.
///
/// Only the last four digits, brand and expiry of the card are kept; the
/// OTP itself is stored as a SHA-256 hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlinePayment {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub amount: f64,
    pub payment_type: OnlinePaymentType,
    pub card_holder_name: String,
    pub card_brand: CardBrand,
    pub card_last4: String,
    pub card_expiry: String,
    pub status: OnlinePaymentStatus,
    pub otp_status: OtpStatus,
    pub otp_hash: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub otp_expires_at: DateTime<Utc>,
    pub otp_attempts: i32,
    #[serde(default, with = "super::optional_bson_datetime")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub struct NewOnlinePayment {
    pub email: String,
    pub amount: f64,
    pub payment_type: OnlinePaymentType,
    pub card_holder_name: String,
    pub card_brand: CardBrand,
    pub card_last4: String,
    pub card_expiry: String,
}

impl OnlinePayment {
    pub fn new(details: NewOnlinePayment, otp_hash: String, otp_ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: details.email,
            amount: details.amount,
            payment_type: details.payment_type,
            card_holder_name: details.card_holder_name,
            card_brand: details.card_brand,
            card_last4: details.card_last4,
            card_expiry: details.card_expiry,
            status: OnlinePaymentStatus::Pending,
            otp_status: OtpStatus::Pending,
            otp_hash,
            otp_expires_at: now + otp_ttl,
            otp_attempts: 0,
            verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check `code_hash` against the stored hash and advance the OTP state.
    pub fn verify_otp(&mut self, code_hash: &str, now: DateTime<Utc>, max_attempts: i32) -> OtpOutcome {
        if self.status != OnlinePaymentStatus::Pending || self.otp_status != OtpStatus::Pending {
            return OtpOutcome::NotPending;
        }

        self.updated_at = now;

        if now >= self.otp_expires_at {
            self.otp_status = OtpStatus::Expired;
            self.status = OnlinePaymentStatus::Failed;
            return OtpOutcome::Expired;
        }

        if self.otp_attempts >= max_attempts {
            self.otp_status = OtpStatus::Locked;
            self.status = OnlinePaymentStatus::Failed;
            return OtpOutcome::Locked;
        }

        self.otp_attempts += 1;

        if constant_time_eq(code_hash, &self.otp_hash) {
            self.otp_status = OtpStatus::Verified;
            self.status = OnlinePaymentStatus::Completed;
            self.verified_at = Some(now);
            return OtpOutcome::Verified;
        }

        let remaining_attempts = max_attempts - self.otp_attempts;
        if remaining_attempts <= 0 {
            self.otp_status = OtpStatus::Locked;
            self.status = OnlinePaymentStatus::Failed;
            return OtpOutcome::Locked;
        }

        OtpOutcome::Invalid { remaining_attempts }
    }

    /// Replace the outstanding code. Only valid while the payment is pending.
    pub fn reissue_otp(&mut self, otp_hash: String, otp_ttl: Duration) -> bool {
        if self.status != OnlinePaymentStatus::Pending {
            return false;
        }
        let now = Utc::now();
        self.otp_hash = otp_hash;
        self.otp_status = OtpStatus::Pending;
        self.otp_attempts = 0;
        self.otp_expires_at = now + otp_ttl;
        self.updated_at = now;
        true
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

impl Entity for OnlinePayment {
    const COLLECTION: &'static str = "online_payments";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

use crate::services::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    General,
    Bidding,
    Payment,
    Account,
    Technical,
    Other,
}

impl InquiryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryType::General => "general",
            InquiryType::Bidding => "bidding",
            InquiryType::Payment => "payment",
            InquiryType::Account => "account",
            InquiryType::Technical => "technical",
            InquiryType::Other => "other",
        }
    }
}

impl FromStr for InquiryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(InquiryType::General),
            "bidding" => Ok(InquiryType::Bidding),
            "payment" => Ok(InquiryType::Payment),
            "account" => Ok(InquiryType::Account),
            "technical" => Ok(InquiryType::Technical),
            "other" => Ok(InquiryType::Other),
            _ => Err(format!(
                "Invalid inquiry type '{}'. Expected one of: general, bidding, payment, account, technical, other",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            _ => Err(format!(
                "Invalid status '{}'. Expected one of: open, in_progress, resolved",
                s
            )),
        }
    }
}

/// The admin reply attached to a support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    pub message: String,
    pub responder: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub inquiry_type: InquiryType,
    pub description: String,
    pub status: TicketStatus,
    /// Holds at most one element; see [`Ticket::set_reply`].
    pub responses: Vec<TicketReply>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        name: String,
        email: String,
        subject: String,
        inquiry_type: InquiryType,
        description: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            subject,
            inquiry_type,
            description,
            status: TicketStatus::Open,
            responses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace whatever reply exists with `message`. Opening a thread on an
    /// `open` ticket moves it to `in_progress`.
    pub fn set_reply(&mut self, message: String, responder: &str) {
        let now = Utc::now();
        let created_at = self.responses.first().map(|r| r.created_at).unwrap_or(now);
        self.responses = vec![TicketReply {
            message,
            responder: responder.to_string(),
            created_at,
            updated_at: now,
        }];
        if self.status == TicketStatus::Open {
            self.status = TicketStatus::InProgress;
        }
        self.updated_at = now;
    }

    /// Edit the existing reply. Returns `false` when there is nothing to edit.
    pub fn edit_reply(&mut self, message: String, responder: &str) -> bool {
        if self.responses.is_empty() {
            return false;
        }
        self.set_reply(message, responder);
        true
    }

    /// Remove the reply. Returns `false` when there was none.
    pub fn clear_reply(&mut self) -> bool {
        if self.responses.is_empty() {
            return false;
        }
        self.responses.clear();
        self.updated_at = Utc::now();
        true
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

impl Entity for Ticket {
    const COLLECTION: &'static str = "tickets";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

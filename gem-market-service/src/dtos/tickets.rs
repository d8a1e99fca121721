use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{InquiryType, Ticket, TicketReply, TicketStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "subject is required"))]
    pub subject: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "inquiryType is required"))]
    pub inquiry_type: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub subject: Option<String>,
    pub inquiry_type: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketListParams {
    pub status: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicketListParams {
    pub status: Option<String>,
    pub inquiry_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTicketStatusRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TicketReplyRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "message is required"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReplyResponse {
    pub message: String,
    pub responder: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TicketReply> for TicketReplyResponse {
    fn from(reply: TicketReply) -> Self {
        Self {
            message: reply.message,
            responder: reply.responder,
            created_at: reply.created_at.to_rfc3339(),
            updated_at: reply.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub inquiry_type: InquiryType,
    pub description: String,
    pub status: TicketStatus,
    pub responses: Vec<TicketReplyResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            name: ticket.name,
            email: ticket.email,
            subject: ticket.subject,
            inquiry_type: ticket.inquiry_type,
            description: ticket.description,
            status: ticket.status,
            responses: ticket.responses.into_iter().map(Into::into).collect(),
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketEnvelope {
    pub success: bool,
    pub ticket: TicketResponse,
}

impl From<Ticket> for TicketEnvelope {
    fn from(ticket: Ticket) -> Self {
        Self {
            success: true,
            ticket: ticket.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub success: bool,
    pub count: usize,
    pub tickets: Vec<TicketResponse>,
}

impl From<Vec<Ticket>> for TicketListResponse {
    fn from(tickets: Vec<Ticket>) -> Self {
        Self {
            success: true,
            count: tickets.len(),
            tickets: tickets.into_iter().map(Into::into).collect(),
        }
    }
}

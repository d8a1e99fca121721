use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use service_core::error::AppError;

use super::{find_or_404, parse_opt, save};
use crate::dtos::{
    CreateTicketRequest, MessageResponse, TicketEnvelope, TicketListParams, TicketListResponse,
    UpdateTicketRequest,
};
use crate::middleware::Requester;
use crate::models::{normalize_email, InquiryType, Ticket, TicketStatus};
use crate::services::{metrics, Filter};
use crate::startup::AppState;
use crate::utils::{ApiPath, ApiQuery, ValidatedJson};

pub async fn list_tickets(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(params): ApiQuery<TicketListParams>,
) -> Result<Json<TicketListResponse>, AppError> {
    let status = parse_opt::<TicketStatus>(params.status.as_deref())?;
    let mut filter = Filter::new().eq_opt("status", status.map(|s| s.as_str()));

    if requester.is_admin {
        filter = filter.eq_opt("email", params.email.as_deref().map(normalize_email));
    } else {
        match requester.listing_email(params.email.as_deref()) {
            Some(email) => filter = filter.eq("email", email),
            None => return Ok(Json(TicketListResponse::from(Vec::new()))),
        }
    }

    let tickets = state.repos.tickets.find(filter).await?;
    Ok(Json(TicketListResponse::from(tickets)))
}

#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn create_ticket(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketEnvelope>), AppError> {
    let inquiry_type: InquiryType = req.inquiry_type.parse().map_err(AppError::bad_request)?;

    let ticket = Ticket::new(
        req.name.trim().to_string(),
        normalize_email(&req.email),
        req.subject.trim().to_string(),
        inquiry_type,
        req.description.trim().to_string(),
    );

    state.repos.tickets.insert(&ticket).await?;
    metrics::record_ticket_created(inquiry_type.as_str());
    tracing::info!(ticket_id = %ticket.id, "Ticket created");

    Ok((StatusCode::CREATED, Json(TicketEnvelope::from(ticket))))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    requester.ensure_can_manage(&ticket.email)?;
    Ok(Json(TicketEnvelope::from(ticket)))
}

#[tracing::instrument(skip(state, requester, req))]
pub async fn update_ticket(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateTicketRequest>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let mut ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    requester.ensure_can_manage(&ticket.email)?;

    if let Some(status) = parse_opt::<TicketStatus>(req.status.as_deref())? {
        if !requester.is_admin {
            return Err(AppError::forbidden("Only admins can change ticket status"));
        }
        ticket.status = status;
    }
    if let Some(inquiry_type) = parse_opt::<InquiryType>(req.inquiry_type.as_deref())? {
        ticket.inquiry_type = inquiry_type;
    }
    if let Some(name) = req.name {
        ticket.name = name.trim().to_string();
    }
    if let Some(subject) = req.subject {
        ticket.subject = subject.trim().to_string();
    }
    if let Some(description) = req.description {
        ticket.description = description.trim().to_string();
    }
    ticket.updated_at = Utc::now();

    save(state.repos.tickets.as_ref(), &ticket, "Ticket").await?;
    tracing::info!(ticket_id = %ticket.id, "Ticket updated");

    Ok(Json(TicketEnvelope::from(ticket)))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    requester.ensure_can_manage(&ticket.email)?;

    if !state.repos.tickets.delete(&ticket.id).await? {
        return Err(AppError::not_found("Ticket not found"));
    }
    tracing::info!(ticket_id = %ticket.id, "Ticket deleted");

    Ok(Json(MessageResponse::new("Ticket deleted")))
}

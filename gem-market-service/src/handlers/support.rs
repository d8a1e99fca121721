//! Admin-side support desk over the same ticket collection.
//!
//! A ticket carries at most one admin reply; posting again overwrites it.

use axum::{extract::State, Json};
use chrono::Utc;
use service_core::error::AppError;

use super::{find_or_404, parse_opt, save};
use crate::dtos::{
    MessageResponse, SupportTicketListParams, TicketEnvelope, TicketListResponse,
    TicketReplyRequest, UpdateTicketStatusRequest,
};
use crate::middleware::AdminOnly;
use crate::models::{InquiryType, TicketStatus};
use crate::services::Filter;
use crate::startup::AppState;
use crate::utils::{ApiPath, ApiQuery, ValidatedJson};

const DEFAULT_RESPONDER: &str = "admin";

fn responder(admin: &AdminOnly) -> &str {
    admin.0.email.as_deref().unwrap_or(DEFAULT_RESPONDER)
}

pub async fn list_tickets(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiQuery(params): ApiQuery<SupportTicketListParams>,
) -> Result<Json<TicketListResponse>, AppError> {
    let status = parse_opt::<TicketStatus>(params.status.as_deref())?;
    let inquiry_type = parse_opt::<InquiryType>(params.inquiry_type.as_deref())?;

    let filter = Filter::new()
        .eq_opt("status", status.map(|s| s.as_str()))
        .eq_opt("inquiry_type", inquiry_type.map(|t| t.as_str()));

    let tickets = state.repos.tickets.find(filter).await?;
    Ok(Json(TicketListResponse::from(tickets)))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    Ok(Json(TicketEnvelope::from(ticket)))
}

#[tracing::instrument(skip(state, _admin, req))]
pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateTicketStatusRequest>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let status: TicketStatus = req.status.parse().map_err(AppError::bad_request)?;

    let mut ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    ticket.status = status;
    ticket.updated_at = Utc::now();
    save(state.repos.tickets.as_ref(), &ticket, "Ticket").await?;

    tracing::info!(ticket_id = %ticket.id, status = %status, "Ticket status changed");
    Ok(Json(TicketEnvelope::from(ticket)))
}

#[tracing::instrument(skip(state, admin, req))]
pub async fn add_response(
    State(state): State<AppState>,
    admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<TicketReplyRequest>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let mut ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    ticket.set_reply(req.message.trim().to_string(), responder(&admin));
    save(state.repos.tickets.as_ref(), &ticket, "Ticket").await?;

    tracing::info!(ticket_id = %ticket.id, "Support response saved");
    Ok(Json(TicketEnvelope::from(ticket)))
}

#[tracing::instrument(skip(state, admin, req))]
pub async fn edit_response(
    State(state): State<AppState>,
    admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<TicketReplyRequest>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let mut ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    if !ticket.edit_reply(req.message.trim().to_string(), responder(&admin)) {
        return Err(AppError::not_found("Ticket has no response to edit"));
    }
    save(state.repos.tickets.as_ref(), &ticket, "Ticket").await?;

    Ok(Json(TicketEnvelope::from(ticket)))
}

pub async fn delete_response(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<TicketEnvelope>, AppError> {
    let mut ticket = find_or_404(state.repos.tickets.as_ref(), &id, "Ticket").await?;
    if !ticket.clear_reply() {
        return Err(AppError::not_found("Ticket has no response"));
    }
    save(state.repos.tickets.as_ref(), &ticket, "Ticket").await?;

    Ok(Json(TicketEnvelope::from(ticket)))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.repos.tickets.delete(&id).await? {
        return Err(AppError::not_found("Ticket not found"));
    }
    tracing::info!(ticket_id = %id, "Ticket deleted by admin");

    Ok(Json(MessageResponse::new("Ticket deleted")))
}

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use service_core::error::AppError;

use super::{find_or_404, parse_opt, save};
use crate::dtos::{
    AuctionEnvelope, AuctionListParams, AuctionListResponse, AuctionResponse, BidListResponse,
    BidPlacedResponse, CreateAuctionRequest, MessageResponse, PlaceBidRequest,
};
use crate::middleware::{AdminOnly, Requester};
use crate::models::{Auction, AuctionState, Bid};
use crate::services::{metrics, Filter};
use crate::startup::AppState;
use crate::utils::{ApiPath, ApiQuery, ValidatedJson};

#[tracing::instrument(skip(state, _admin, req), fields(gemstone_id = %req.gemstone_id))]
pub async fn create_auction(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ValidatedJson(req): ValidatedJson<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<AuctionEnvelope>), AppError> {
    if req.end_time <= req.start_time {
        return Err(AppError::bad_request("endTime must be after startTime"));
    }

    let mut gem = find_or_404(state.repos.gemstones.as_ref(), &req.gemstone_id, "Gemstone").await?;
    if gem.is_auctioned {
        return Err(AppError::conflict("Gemstone is already auctioned"));
    }

    let auction = Auction::new(
        gem.id.clone(),
        gem.name.clone(),
        req.starting_bid.unwrap_or(gem.minimum_bid),
        req.start_time,
        req.end_time,
    );
    state.repos.auctions.insert(&auction).await?;

    gem.is_auctioned = true;
    gem.updated_at = Utc::now();
    save(state.repos.gemstones.as_ref(), &gem, "Gemstone").await?;

    tracing::info!(auction_id = %auction.id, "Auction scheduled");
    Ok((StatusCode::CREATED, Json(AuctionEnvelope::from(auction))))
}

pub async fn list_auctions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AuctionListParams>,
) -> Result<Json<AuctionListResponse>, AppError> {
    let wanted = parse_opt::<AuctionState>(params.state.as_deref())?;
    let now = Utc::now();

    let auctions: Vec<AuctionResponse> = state
        .repos
        .auctions
        .find(Filter::new())
        .await?
        .into_iter()
        .filter(|a| wanted.map_or(true, |s| a.state_at(now) == s))
        .map(|a| AuctionResponse::at(a, now))
        .collect();

    Ok(Json(AuctionListResponse {
        success: true,
        count: auctions.len(),
        auctions,
    }))
}

pub async fn get_auction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<AuctionEnvelope>, AppError> {
    let auction = find_or_404(state.repos.auctions.as_ref(), &id, "Auction").await?;
    Ok(Json(AuctionEnvelope::from(auction)))
}

#[tracing::instrument(skip(state, requester, req))]
pub async fn place_bid(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<PlaceBidRequest>,
) -> Result<(StatusCode, Json<BidPlacedResponse>), AppError> {
    let bidder = requester.require_email()?.to_string();
    let mut auction = find_or_404(state.repos.auctions.as_ref(), &id, "Auction").await?;

    let now = Utc::now();
    if let Err(e) = auction.place_bid(&bidder, req.amount, now) {
        metrics::record_bid(false);
        return Err(e);
    }

    let bid = Bid::new(auction.id.clone(), bidder, req.amount);
    state.repos.bids.insert(&bid).await?;
    save(state.repos.auctions.as_ref(), &auction, "Auction").await?;

    metrics::record_bid(true);
    tracing::info!(auction_id = %auction.id, amount = bid.amount, "Bid accepted");

    Ok((
        StatusCode::CREATED,
        Json(BidPlacedResponse {
            success: true,
            bid: bid.into(),
            auction: AuctionResponse::at(auction, now),
        }),
    ))
}

/// Bids on an auction, highest first.
pub async fn list_bids(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<BidListResponse>, AppError> {
    let auction = find_or_404(state.repos.auctions.as_ref(), &id, "Auction").await?;

    let mut bids = state
        .repos
        .bids
        .find(Filter::new().eq("auction_id", auction.id.as_str()))
        .await?;
    bids.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    Ok(Json(BidListResponse {
        success: true,
        count: bids.len(),
        bids: bids.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip(state, _admin))]
pub async fn close_auction(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<AuctionEnvelope>, AppError> {
    let mut auction = find_or_404(state.repos.auctions.as_ref(), &id, "Auction").await?;
    if auction.closed {
        return Err(AppError::conflict("Auction is already closed"));
    }

    auction.close();
    save(state.repos.auctions.as_ref(), &auction, "Auction").await?;

    tracing::info!(
        auction_id = %auction.id,
        winner = auction.winner_email.as_deref().unwrap_or("-"),
        "Auction closed"
    );
    Ok(Json(AuctionEnvelope::from(auction)))
}

#[tracing::instrument(skip(state, _admin))]
pub async fn delete_auction(
    State(state): State<AppState>,
    _admin: AdminOnly,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let auction = find_or_404(state.repos.auctions.as_ref(), &id, "Auction").await?;

    let removed_bids = state
        .repos
        .bids
        .delete_many(Filter::new().eq("auction_id", auction.id.as_str()))
        .await?;
    state.repos.auctions.delete(&auction.id).await?;

    if let Some(mut gem) = state.repos.gemstones.find_by_id(&auction.gemstone_id).await? {
        gem.is_auctioned = false;
        gem.updated_at = Utc::now();
        state.repos.gemstones.replace(&gem).await?;
    }

    tracing::info!(auction_id = %auction.id, removed_bids, "Auction deleted");
    Ok(Json(MessageResponse::new("Auction deleted")))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Auction, AuctionState, Bid};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "gemstoneId is required"))]
    pub gemstone_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(range(exclusive_min = 0.0, message = "startingBid must be greater than zero"))]
    pub starting_bid: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuctionListParams {
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceBidRequest {
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "amount must be greater than zero"))]
    pub amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionResponse {
    pub id: String,
    pub gemstone_id: String,
    pub gemstone_name: String,
    pub starting_bid: f64,
    pub current_bid: Option<f64>,
    pub highest_bidder: Option<String>,
    pub bid_count: i64,
    pub start_time: String,
    pub end_time: String,
    pub closed: bool,
    pub winner_email: Option<String>,
    pub state: AuctionState,
    pub created_at: String,
    pub updated_at: String,
}

impl AuctionResponse {
    /// Render with the state derived at `now`.
    pub fn at(auction: Auction, now: DateTime<Utc>) -> Self {
        Self {
            state: auction.state_at(now),
            id: auction.id,
            gemstone_id: auction.gemstone_id,
            gemstone_name: auction.gemstone_name,
            starting_bid: auction.starting_bid,
            current_bid: auction.current_bid,
            highest_bidder: auction.highest_bidder,
            bid_count: auction.bid_count,
            start_time: auction.start_time.to_rfc3339(),
            end_time: auction.end_time.to_rfc3339(),
            closed: auction.closed,
            winner_email: auction.winner_email,
            created_at: auction.created_at.to_rfc3339(),
            updated_at: auction.updated_at.to_rfc3339(),
        }
    }
}

impl From<Auction> for AuctionResponse {
    fn from(auction: Auction) -> Self {
        Self::at(auction, Utc::now())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    pub id: String,
    pub auction_id: String,
    pub bidder_email: String,
    pub amount: f64,
    pub created_at: String,
}

impl From<Bid> for BidResponse {
    fn from(bid: Bid) -> Self {
        Self {
            id: bid.id,
            auction_id: bid.auction_id,
            bidder_email: bid.bidder_email,
            amount: bid.amount,
            created_at: bid.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuctionEnvelope {
    pub success: bool,
    pub auction: AuctionResponse,
}

impl From<Auction> for AuctionEnvelope {
    fn from(auction: Auction) -> Self {
        Self {
            success: true,
            auction: auction.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuctionListResponse {
    pub success: bool,
    pub count: usize,
    pub auctions: Vec<AuctionResponse>,
}

#[derive(Debug, Serialize)]
pub struct BidPlacedResponse {
    pub success: bool,
    pub bid: BidResponse,
    pub auction: AuctionResponse,
}

#[derive(Debug, Serialize)]
pub struct BidListResponse {
    pub success: bool,
    pub count: usize,
    pub bids: Vec<BidResponse>,
}

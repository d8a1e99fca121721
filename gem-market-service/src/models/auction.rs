use crate::services::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle phase of an auction, derived from its schedule and `closed` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuctionState {
    Upcoming,
    Live,
    Ended,
}

impl FromStr for AuctionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(AuctionState::Upcoming),
            "live" => Ok(AuctionState::Live),
            "ended" => Ok(AuctionState::Ended),
            _ => Err(format!(
                "Invalid state '{}'. Expected one of: upcoming, live, ended",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    #[serde(rename = "_id")]
    pub id: String,
    pub gemstone_id: String,
    pub gemstone_name: String,
    pub starting_bid: f64,
    pub current_bid: Option<f64>,
    pub highest_bidder: Option<String>,
    pub bid_count: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    pub closed: bool,
    pub winner_email: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    pub fn new(
        gemstone_id: String,
        gemstone_name: String,
        starting_bid: f64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            gemstone_id,
            gemstone_name,
            starting_bid,
            current_bid: None,
            highest_bidder: None,
            bid_count: 0,
            start_time,
            end_time,
            closed: false,
            winner_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> AuctionState {
        if self.closed || now >= self.end_time {
            AuctionState::Ended
        } else if now < self.start_time {
            AuctionState::Upcoming
        } else {
            AuctionState::Live
        }
    }

    /// Accept a bid if the auction is live and the amount beats the current price.
    pub fn place_bid(
        &mut self,
        bidder_email: &str,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        match self.state_at(now) {
            AuctionState::Live => {}
            AuctionState::Upcoming => {
                return Err(AppError::conflict("Auction has not started yet"));
            }
            AuctionState::Ended => return Err(AppError::conflict("Auction has ended")),
        }

        if !amount.is_finite() || amount < self.starting_bid {
            return Err(AppError::bad_request(format!(
                "Bid must be at least the starting bid of {:.2}",
                self.starting_bid
            )));
        }

        if let Some(current) = self.current_bid {
            if amount <= current {
                return Err(AppError::bad_request(format!(
                    "Bid must be higher than the current bid of {:.2}",
                    current
                )));
            }
        }

        self.current_bid = Some(amount);
        self.highest_bidder = Some(bidder_email.to_string());
        self.bid_count += 1;
        self.updated_at = now;
        Ok(())
    }

    /// Close the auction early or after its end time, recording the winner.
    pub fn close(&mut self) {
        self.closed = true;
        self.winner_email = self.highest_bidder.clone();
        self.updated_at = Utc::now();
    }
}

impl Entity for Auction {
    const COLLECTION: &'static str = "auctions";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    #[serde(rename = "_id")]
    pub id: String,
    pub auction_id: String,
    pub bidder_email: String,
    pub amount: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Bid {
    pub fn new(auction_id: String, bidder_email: String, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            auction_id,
            bidder_email,
            amount,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Bid {
    const COLLECTION: &'static str = "bids";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

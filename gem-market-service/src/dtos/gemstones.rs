use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Gemstone;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemstoneListParams {
    pub category: Option<String>,
    pub is_auctioned: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGemstoneRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub category: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "weight must be greater than zero"))]
    pub weight: Option<f64>,
    #[validate(length(min = 1))]
    pub certificate_details: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "minimumBid must be greater than zero"))]
    pub minimum_bid: Option<f64>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub origin: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GemstoneResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub weight: f64,
    pub certificate_details: String,
    pub minimum_bid: f64,
    pub description: Option<String>,
    pub color: Option<String>,
    pub origin: Option<String>,
    pub images: Vec<String>,
    pub seller_email: Option<String>,
    pub is_auctioned: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Gemstone> for GemstoneResponse {
    fn from(gem: Gemstone) -> Self {
        Self {
            id: gem.id,
            name: gem.name,
            category: gem.category,
            weight: gem.weight,
            certificate_details: gem.certificate_details,
            minimum_bid: gem.minimum_bid,
            description: gem.description,
            color: gem.color,
            origin: gem.origin,
            images: gem.images,
            seller_email: gem.seller_email,
            is_auctioned: gem.is_auctioned,
            created_at: gem.created_at.to_rfc3339(),
            updated_at: gem.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GemstoneEnvelope {
    pub success: bool,
    pub gemstone: GemstoneResponse,
}

impl From<Gemstone> for GemstoneEnvelope {
    fn from(gem: Gemstone) -> Self {
        Self {
            success: true,
            gemstone: gem.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GemstoneListResponse {
    pub success: bool,
    pub count: usize,
    pub gemstones: Vec<GemstoneResponse>,
}

impl From<Vec<Gemstone>> for GemstoneListResponse {
    fn from(gems: Vec<Gemstone>) -> Self {
        Self {
            success: true,
            count: gems.len(),
            gemstones: gems.into_iter().map(Into::into).collect(),
        }
    }
}

use crate::services::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix under which stored files are served.
pub const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gemstone {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    /// Carats.
    pub weight: f64,
    pub certificate_details: String,
    pub minimum_bid: f64,
    pub description: Option<String>,
    pub color: Option<String>,
    pub origin: Option<String>,
    pub images: Vec<String>,
    pub seller_email: Option<String>,
    /// Listed on the auction page only when true.
    pub is_auctioned: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub struct NewGemstone {
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
}

impl Gemstone {
    pub fn new(details: NewGemstone) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: details.name,
            category: details.category,
            weight: details.weight,
            certificate_details: details.certificate_details,
            minimum_bid: details.minimum_bid,
            description: details.description,
            color: details.color,
            origin: details.origin,
            images: details.images.iter().map(|i| normalize_image_url(i)).collect(),
            seller_email: details.seller_email,
            is_auctioned: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Admins can manage every listing; sellers only their own.
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.seller_email
            .as_deref()
            .is_some_and(|seller| seller.eq_ignore_ascii_case(email))
    }

    /// Storage keys of images this service stored itself.
    pub fn stored_image_keys(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|url| url.strip_prefix(UPLOADS_PREFIX))
            .map(str::to_string)
            .collect()
    }
}

/// Canonical form for image references: forward slashes, no `./`, one leading `/`.
///
/// Absolute `http(s)://` URLs are kept as given.
pub fn normalize_image_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    let mut path = trimmed.replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

impl Entity for Gemstone {
    const COLLECTION: &'static str = "gemstones";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_windows_and_relative_paths() {
        assert_eq!(
            normalize_image_url("uploads\\gemstones\\a.jpg"),
            "/uploads/gemstones/a.jpg"
        );
        assert_eq!(
            normalize_image_url("./uploads/gemstones/a.jpg"),
            "/uploads/gemstones/a.jpg"
        );
        assert_eq!(
            normalize_image_url("//uploads//gemstones/a.jpg"),
            "/uploads/gemstones/a.jpg"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_image_url("uploads\\gemstones\\b.png");
        assert_eq!(normalize_image_url(&once), once);
    }

    #[test]
    fn absolute_urls_are_untouched() {
        assert_eq!(
            normalize_image_url(" https://cdn.example.com/x.jpg "),
            "https://cdn.example.com/x.jpg"
        );
    }

    #[test]
    fn stored_image_keys_skip_external_images() {
        let gem = Gemstone::new(NewGemstone {
            name: "Blue Sapphire".to_string(),
            category: "sapphire".to_string(),
            weight: 2.4,
            certificate_details: "GIA 123".to_string(),
            minimum_bid: 1000.0,
            description: None,
            color: None,
            origin: None,
            images: vec![
                "uploads/gemstones/a.jpg".to_string(),
                "https://cdn.example.com/b.jpg".to_string(),
            ],
            seller_email: Some("seller@example.com".to_string()),
        });

        assert_eq!(gem.stored_image_keys(), vec!["gemstones/a.jpg".to_string()]);
        assert!(gem.is_owned_by("Seller@Example.com"));
    }
}

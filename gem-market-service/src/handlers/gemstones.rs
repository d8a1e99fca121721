use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashSet;
use uuid::Uuid;

use super::{find_or_404, save};
use crate::dtos::{
    GemstoneEnvelope, GemstoneListParams, GemstoneListResponse, MessageResponse,
    UpdateGemstoneRequest,
};
use crate::middleware::Requester;
use crate::models::gemstone::{NewGemstone, UPLOADS_PREFIX};
use crate::models::{normalize_image_url, AuctionState, Gemstone};
use crate::services::{Filter, Storage};
use crate::startup::AppState;
use crate::utils::{ApiPath, ApiQuery, MultipartForm, ValidatedJson};

pub const MAX_IMAGES_PER_LISTING: usize = 10;

const IMAGES_FIELD: &str = "images";

fn ensure_can_manage(requester: &Requester, gem: &Gemstone) -> Result<(), AppError> {
    let is_seller = requester
        .email
        .as_deref()
        .is_some_and(|email| gem.is_owned_by(email));
    if requester.is_admin || is_seller {
        Ok(())
    } else {
        Err(AppError::forbidden("Only an admin or the seller can manage this listing"))
    }
}

async fn remove_stored_images(storage: &dyn Storage, keys: impl IntoIterator<Item = String>) {
    for key in keys {
        if let Err(e) = storage.delete(&key).await {
            tracing::warn!("Failed to remove gemstone image {}: {}", key, e);
        }
    }
}

#[tracing::instrument(skip_all)]
pub async fn create_gemstone(
    State(state): State<AppState>,
    requester: Requester,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GemstoneEnvelope>), AppError> {
    if !requester.is_admin {
        requester.require_email()?;
    }

    let mut form = MultipartForm::collect(multipart, state.config.storage.max_upload_bytes).await?;

    let name = form.required_text("name")?;
    let category = form.required_text("category")?;
    let weight = form.required_positive("weight")?;
    let certificate_details = form.required_text("certificateDetails")?;
    let minimum_bid = form.required_positive("minimumBid")?;

    let files = form.take_files(IMAGES_FIELD);
    if files.len() > MAX_IMAGES_PER_LISTING {
        return Err(AppError::bad_request(format!(
            "At most {} images are allowed",
            MAX_IMAGES_PER_LISTING
        )));
    }
    if let Some(bad) = files.iter().find(|f| !f.is_image()) {
        return Err(AppError::bad_request(format!(
            "'{}' is not an image",
            bad.file_name
        )));
    }

    let mut stored_keys = Vec::with_capacity(files.len());
    for file in files {
        let key = format!("gemstones/{}.{}", Uuid::new_v4(), file.extension());
        if let Err(e) = state.storage.upload(&key, file.data).await {
            tracing::error!("Failed to store gemstone image {}: {}", key, e);
            remove_stored_images(state.storage.as_ref(), stored_keys).await;
            return Err(e);
        }
        stored_keys.push(key);
    }

    let gem = Gemstone::new(NewGemstone {
        name,
        category,
        weight,
        certificate_details,
        minimum_bid,
        description: form.text("description"),
        color: form.text("color"),
        origin: form.text("origin"),
        images: stored_keys
            .iter()
            .map(|key| format!("{}{}", UPLOADS_PREFIX, key))
            .collect(),
        seller_email: requester.email.clone(),
    });

    if let Err(e) = state.repos.gemstones.insert(&gem).await {
        remove_stored_images(state.storage.as_ref(), stored_keys).await;
        return Err(e);
    }
    tracing::info!(gemstone_id = %gem.id, images = gem.images.len(), "Gemstone listed");

    Ok((StatusCode::CREATED, Json(GemstoneEnvelope::from(gem))))
}

pub async fn list_gemstones(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<GemstoneListParams>,
) -> Result<Json<GemstoneListResponse>, AppError> {
    let category = params
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let filter = Filter::new()
        .eq_opt("category", category)
        .eq_opt("is_auctioned", params.is_auctioned);

    let gems = state.repos.gemstones.find(filter).await?;
    Ok(Json(GemstoneListResponse::from(gems)))
}

pub async fn list_auctioned(
    State(state): State<AppState>,
) -> Result<Json<GemstoneListResponse>, AppError> {
    let gems = state
        .repos
        .gemstones
        .find(Filter::new().eq("is_auctioned", true))
        .await?;
    Ok(Json(GemstoneListResponse::from(gems)))
}

pub async fn get_gemstone(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<GemstoneEnvelope>, AppError> {
    let gem = find_or_404(state.repos.gemstones.as_ref(), &id, "Gemstone").await?;
    Ok(Json(GemstoneEnvelope::from(gem)))
}

#[tracing::instrument(skip(state, requester, req))]
pub async fn update_gemstone(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateGemstoneRequest>,
) -> Result<Json<GemstoneEnvelope>, AppError> {
    let mut gem = find_or_404(state.repos.gemstones.as_ref(), &id, "Gemstone").await?;
    ensure_can_manage(&requester, &gem)?;

    if let Some(name) = req.name {
        gem.name = name.trim().to_string();
    }
    if let Some(category) = req.category {
        gem.category = category.trim().to_string();
    }
    if let Some(weight) = req.weight {
        gem.weight = weight;
    }
    if let Some(certificate_details) = req.certificate_details {
        gem.certificate_details = certificate_details;
    }
    if let Some(minimum_bid) = req.minimum_bid {
        gem.minimum_bid = minimum_bid;
    }
    if let Some(description) = req.description {
        gem.description = Some(description);
    }
    if let Some(color) = req.color {
        gem.color = Some(color);
    }
    if let Some(origin) = req.origin {
        gem.origin = Some(origin);
    }

    let mut dropped_keys = Vec::new();
    if let Some(images) = req.images {
        if images.len() > MAX_IMAGES_PER_LISTING {
            return Err(AppError::bad_request(format!(
                "At most {} images are allowed",
                MAX_IMAGES_PER_LISTING
            )));
        }
        let previous = gem.stored_image_keys();
        let owned: HashSet<&str> = previous.iter().map(String::as_str).collect();
        let images: Vec<String> = images.iter().map(|i| normalize_image_url(i)).collect();
        if let Some(foreign) = images.iter().find(|url| {
            url.strip_prefix(UPLOADS_PREFIX)
                .is_some_and(|key| !owned.contains(key))
        }) {
            return Err(AppError::bad_request(format!(
                "'{}' is not an image of this listing",
                foreign
            )));
        }

        gem.images = images;
        let kept: HashSet<String> = gem.stored_image_keys().into_iter().collect();
        dropped_keys = previous.into_iter().filter(|k| !kept.contains(k)).collect();
    }
    gem.updated_at = Utc::now();

    save(state.repos.gemstones.as_ref(), &gem, "Gemstone").await?;
    remove_stored_images(state.storage.as_ref(), dropped_keys).await;
    tracing::info!(gemstone_id = %gem.id, "Gemstone updated");

    Ok(Json(GemstoneEnvelope::from(gem)))
}

pub async fn delete_gemstone(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let gem = find_or_404(state.repos.gemstones.as_ref(), &id, "Gemstone").await?;
    ensure_can_manage(&requester, &gem)?;

    let now = Utc::now();
    let auctions = state
        .repos
        .auctions
        .find(Filter::new().eq("gemstone_id", gem.id.as_str()))
        .await?;
    if auctions
        .iter()
        .any(|auction| auction.state_at(now) != AuctionState::Ended)
    {
        return Err(AppError::conflict("Gemstone has an open auction"));
    }

    if !state.repos.gemstones.delete(&gem.id).await? {
        return Err(AppError::not_found("Gemstone not found"));
    }

    let mut removed_bids = 0;
    for auction in &auctions {
        removed_bids += state
            .repos
            .bids
            .delete_many(Filter::new().eq("auction_id", auction.id.as_str()))
            .await?;
    }
    let removed_auctions = state
        .repos
        .auctions
        .delete_many(Filter::new().eq("gemstone_id", gem.id.as_str()))
        .await?;
    remove_stored_images(state.storage.as_ref(), gem.stored_image_keys()).await;
    tracing::info!(
        gemstone_id = %gem.id,
        removed_auctions,
        removed_bids,
        "Gemstone deleted"
    );

    Ok(Json(MessageResponse::new("Gemstone deleted")))
}

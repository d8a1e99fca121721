//! Caller identity extracted from request headers.
//!
//! Admins authenticate with a bearer token from `POST /api/admin/session`
//! (or, when enabled, the raw `x-admin-secret`). Everyone else identifies
//! themselves with `x-user-email`, which is only used for ownership checks.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::utils::constant_time_eq;

use crate::models::normalize_email;
use crate::startup::AppState;

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone, Default)]
pub struct Requester {
    pub is_admin: bool,
    pub email: Option<String>,
}

impl Requester {
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            email: None,
        }
    }

    pub fn user(email: &str) -> Self {
        Self {
            is_admin: false,
            email: Some(normalize_email(email)),
        }
    }

    /// Admin, or the caller's email equals `owner_email`.
    pub fn can_manage(&self, owner_email: &str) -> bool {
        self.is_admin
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.eq_ignore_ascii_case(owner_email))
    }

    pub fn ensure_can_manage(&self, owner_email: &str) -> Result<(), AppError> {
        if self.can_manage(owner_email) {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not allowed to access this resource"))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin access required"))
        }
    }

    pub fn require_email(&self) -> Result<&str, AppError> {
        self.email.as_deref().ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing {} header", USER_EMAIL_HEADER))
        })
    }

    /// Email a non-admin listing is scoped to: the header, else the query parameter.
    pub fn listing_email(&self, query_email: Option<&str>) -> Option<String> {
        self.email.clone().or_else(|| {
            query_email
                .map(normalize_email)
                .filter(|email| !email.is_empty())
        })
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
                .await
                .unwrap_or(None);

        let mut is_admin = false;

        if let Some(TypedHeader(Authorization(bearer))) = bearer {
            state.sessions.verify(bearer.token()).map_err(|e| {
                tracing::warn!("Rejected admin bearer token: {}", e);
                e
            })?;
            is_admin = true;
        }

        if !is_admin && state.config.admin.allow_legacy_secret {
            if let Some(secret) = header_str(parts, ADMIN_SECRET_HEADER) {
                if constant_time_eq(secret, state.config.admin.secret.expose_secret()) {
                    is_admin = true;
                } else {
                    tracing::warn!("Failed admin secret attempt");
                }
            }
        }

        let email = header_str(parts, USER_EMAIL_HEADER).map(normalize_email);

        Ok(Requester { is_admin, email })
    }
}

/// Rejects non-admin callers with 403.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Requester);

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let requester = Requester::from_request_parts(parts, state).await?;
        requester.require_admin()?;
        Ok(AdminOnly(requester))
    }
}

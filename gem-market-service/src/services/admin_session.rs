//! Signed admin sessions.
//!
//! An operator trades the shared admin secret for a short-lived HS256 token
//! and presents it as a bearer token afterwards.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::config::AdminConfig;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Clone)]
pub struct AdminSessions {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl AdminSessions {
    pub fn new(config: &AdminConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds: config.session_ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a new admin token.
    pub fn issue(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: ADMIN_ROLE.to_string(),
            role: ADMIN_ROLE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Validate signature, expiry and role.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AdminClaims>(token, &self.decoding_key, &validation)?;

        if data.claims.role != ADMIN_ROLE {
            return Err(AppError::forbidden("Token does not carry the admin role"));
        }

        Ok(data.claims)
    }
}

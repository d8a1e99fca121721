use secrecy::Secret;
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct GemMarketConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub otp: OtpConfig,
    pub rate_limit: RateLimitConfig,
    /// Allowed browser origin for the storefront; `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
    /// When set, spans are exported over OTLP.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub local_path: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Shared secret exchanged for a signed admin session.
    pub secret: Secret<String>,
    /// HMAC key for admin session tokens.
    pub jwt_secret: Secret<String>,
    pub session_ttl_seconds: i64,
    /// Accept `x-admin-secret` on every request, not only at session creation.
    pub allow_legacy_secret: bool,
}

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub ttl_seconds: i64,
    pub max_attempts: i32,
    /// Development aid: include the generated code in the create/resend response.
    pub expose_in_response: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub per_minute: u32,
}

impl GemMarketConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_production();

        Ok(GemMarketConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("gem_market_db"), is_prod)?,
            },
            storage: StorageConfig {
                local_path: get_env("STORAGE_LOCAL_PATH", Some("uploads"), is_prod)?,
                max_upload_bytes: get_env_parsed("UPLOAD_MAX_BYTES", "5242880", is_prod)?,
            },
            admin: AdminConfig {
                secret: Secret::new(get_env("ADMIN_SECRET", Some("dev-admin-secret"), is_prod)?),
                jwt_secret: Secret::new(get_env(
                    "ADMIN_JWT_SECRET",
                    Some("dev-jwt-secret-change-me"),
                    is_prod,
                )?),
                session_ttl_seconds: get_env_parsed("ADMIN_SESSION_TTL_SECONDS", "3600", is_prod)?,
                allow_legacy_secret: env_flag("ADMIN_ALLOW_LEGACY_SECRET", true, is_prod)?,
            },
            otp: OtpConfig {
                ttl_seconds: get_env_parsed("OTP_TTL_SECONDS", "300", is_prod)?,
                max_attempts: get_env_parsed("OTP_MAX_ATTEMPTS", "5", is_prod)?,
                expose_in_response: env_flag("OTP_EXPOSE_IN_RESPONSE", false, is_prod)?,
            },
            rate_limit: RateLimitConfig {
                per_minute: get_env_parsed("RATE_LIMIT_PER_MINUTE", "30", is_prod)?,
            },
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok().filter(|s| !s.is_empty()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

/// Boolean switch: `true` or `false`. Required in production like any other variable.
fn env_flag(key: &str, default: bool, is_prod: bool) -> Result<bool, AppError> {
    get_env_parsed(key, if default { "true" } else { "false" }, is_prod)
}

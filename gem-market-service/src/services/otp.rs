//! One-time codes for confirming online payments.

use async_trait::async_trait;
use rand::Rng;
use service_core::error::AppError;
use service_core::utils::sha256_hex;
use std::sync::Mutex;

pub const OTP_LENGTH: usize = 6;

/// Generate a numeric code of `length` digits.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Hash a code for storage; only hashes are ever persisted.
pub fn hash_otp(code: &str) -> String {
    sha256_hex(code.trim())
}

/// Delivers a freshly issued code to the payer.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn deliver(&self, email: &str, payment_id: &str, code: &str) -> Result<(), AppError>;
}

/// Writes the code to the service log. Stands in for an email/SMS channel.
pub struct LogOtpNotifier;

#[async_trait]
impl OtpNotifier for LogOtpNotifier {
    async fn deliver(&self, email: &str, payment_id: &str, code: &str) -> Result<(), AppError> {
        tracing::info!(
            to = %email,
            payment_id = %payment_id,
            otp = %code,
            "[MOCK] Payment OTP would be sent"
        );
        Ok(())
    }
}

/// Keeps every delivered code in memory so callers can read it back.
#[derive(Default)]
pub struct RecordingOtpNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingOtpNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code delivered for `payment_id`.
    pub fn last_code_for(&self, payment_id: &str) -> Option<String> {
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(id, _)| id == payment_id)
            .map(|(_, code)| code.clone())
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl OtpNotifier for RecordingOtpNotifier {
    async fn deliver(&self, _email: &str, payment_id: &str, code: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("OTP recorder poisoned")))?
            .push((payment_id.to_string(), code.to_string()));
        Ok(())
    }
}

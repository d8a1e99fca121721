use chrono::{Datelike, NaiveDate};
use service_core::error::AppError;
use thiserror::Error;

use crate::models::CardBrand;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("Card number must contain 13 to 19 digits")]
    InvalidLength,

    #[error("Card number is not valid")]
    InvalidChecksum,

    #[error("Expiry date must be in MM/YY format")]
    InvalidExpiry,

    #[error("Card has expired")]
    Expired,

    #[error("CVV must be 3 or 4 digits")]
    InvalidCvv,
}

impl From<CardError> for AppError {
    fn from(err: CardError) -> Self {
        AppError::bad_request(err)
    }
}

/// What is kept of a card after it passes validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCard {
    pub last4: String,
    pub brand: CardBrand,
    /// Normalized `MM/YY`.
    pub expiry: String,
}

/// Luhn (mod 10) checksum over a string of ASCII digits.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

/// Parse `MM/YY` into (year, month). The card is valid through the end of that month.
fn parse_expiry(expiry: &str) -> Result<(i32, u32), CardError> {
    let (mm, yy) = expiry.trim().split_once('/').ok_or(CardError::InvalidExpiry)?;
    let (mm, yy) = (mm.trim(), yy.trim());
    if mm.len() != 2 || yy.len() != 2 {
        return Err(CardError::InvalidExpiry);
    }
    let month: u32 = mm.parse().map_err(|_| CardError::InvalidExpiry)?;
    let year: i32 = yy.parse().map_err(|_| CardError::InvalidExpiry)?;
    if !(1..=12).contains(&month) {
        return Err(CardError::InvalidExpiry);
    }
    Ok((2000 + year, month))
}

/// Check number, expiry and CVV. Spaces and dashes in the number are ignored.
pub fn validate_card(
    number: &str,
    expiry: &str,
    cvv: &str,
    today: NaiveDate,
) -> Result<ValidatedCard, CardError> {
    let digits: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    if !(13..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::InvalidLength);
    }
    if !luhn_valid(&digits) {
        return Err(CardError::InvalidChecksum);
    }

    let (year, month) = parse_expiry(expiry)?;
    if (year, month) < (today.year(), today.month()) {
        return Err(CardError::Expired);
    }

    let cvv = cvv.trim();
    if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(CardError::InvalidCvv);
    }

    Ok(ValidatedCard {
        last4: digits[digits.len() - 4..].to_string(),
        brand: CardBrand::detect(&digits),
        expiry: format!("{:02}/{:02}", month, year % 100),
    })
}

pub mod admin;
pub mod auctions;
pub mod feedbacks;
pub mod gemstones;
pub mod online_payments;
pub mod payments;
pub mod tickets;

pub use admin::*;
pub use auctions::*;
pub use feedbacks::*;
pub use gemstones::*;
pub use online_payments::*;
pub use payments::*;
pub use tickets::*;

use serde::Serialize;

/// `{ success: true, message }` for operations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub mod auction;
pub mod feedback;
pub mod gemstone;
pub mod online_payment;
pub mod payment;
pub mod ticket;

pub use auction::{Auction, AuctionState, Bid};
pub use feedback::Feedback;
pub use gemstone::{normalize_image_url, Gemstone};
pub use online_payment::{
    CardBrand, OnlinePayment, OnlinePaymentStatus, OnlinePaymentType, OtpOutcome, OtpStatus,
};
pub use payment::{Payment, PaymentStatus};
pub use ticket::{InquiryType, Ticket, TicketReply, TicketStatus};

/// Lowercase and trim an email so ownership checks compare like with like.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `Option<DateTime<Utc>>` stored as an optional BSON datetime.
pub(crate) mod optional_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|dt| dt.to_chrono()))
    }
}

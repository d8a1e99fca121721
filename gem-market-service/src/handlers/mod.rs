pub mod admin;
pub mod auctions;
pub mod feedbacks;
pub mod gemstones;
pub mod health;
pub mod online_payments;
pub mod payments;
pub mod support;
pub mod tickets;
pub mod uploads;

use service_core::error::AppError;
use std::str::FromStr;

use crate::services::{Entity, Repository};

/// Load a record by id or fail with 404 naming `what`.
pub(crate) async fn find_or_404<T: Entity>(
    repo: &dyn Repository<T>,
    id: &str,
    what: &str,
) -> Result<T, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} not found", what)))
}

/// Persist `item`, treating a record that vanished mid-request as 404.
pub(crate) async fn save<T: Entity>(
    repo: &dyn Repository<T>,
    item: &T,
    what: &str,
) -> Result<(), AppError> {
    if repo.replace(item).await? {
        Ok(())
    } else {
        Err(AppError::not_found(format!("{} not found", what)))
    }
}

/// Parse an optional enum query/body value, mapping the parse error to 400.
pub(crate) fn parse_opt<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = String>,
{
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(T::from_str)
        .transpose()
        .map_err(AppError::bad_request)
}

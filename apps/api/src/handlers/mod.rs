//! HTTP handlers, one module per resource.
//!
//! Handlers take typed request DTOs, validate them at the boundary and
//! hand an explicit [`Actor`](tillpoint_core::Actor) to anything that acts
//! on behalf of the caller.

pub mod auth;
pub mod customers;
pub mod health;
pub mod products;
pub mod reports;
pub mod sales;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tillpoint_core::{Money, ValidationError};

/// Parses a `YYYY-MM-DD` date or an RFC 3339 timestamp.
///
/// A bare date used as an upper bound means "through the end of that
/// day", so it becomes the start of the next day (exclusive).
pub(crate) fn parse_date_bound(
    field: &str,
    raw: &str,
    upper: bool,
) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let day = if upper { day.succ_opt().unwrap_or(day) } else { day };
        return Ok(tillpoint_core::report::day_bounds(day).0);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        })
}

/// Decimal amount to cents, rejecting negatives and sub-cent precision.
pub(crate) fn non_negative_money(field: &str, amount: Decimal) -> Result<Money, ValidationError> {
    let money = Money::try_from_decimal(field, amount)?;
    if money.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(money)
}

/// Trims an optional text field; blank becomes `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

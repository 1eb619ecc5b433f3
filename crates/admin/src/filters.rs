//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Format a decimal amount as a Euro price.
///
/// Usage in templates: `{{ stats.revenue|eur }}`
#[askama::filter_fn]
pub fn eur(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let s = value.to_string();
    Ok(s.parse::<Decimal>()
        .map_or_else(|_| format!("{s} €"), mybookstore_core::format_eur))
}

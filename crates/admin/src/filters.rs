//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a stock count as pieces: `0 st`, `12 st`.
///
/// Usage in templates: `{{ size.online|st }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn st(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("{count} st"))
}

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

/// Formats a count with the Swedish word for items: `1 vara`, `3 varor`.
///
/// Usage in templates: `{{ layout.cart_count|varor }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn varor(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let count = count.to_string();
    let word = if count == "1" { "vara" } else { "varor" };
    Ok(format!("{count} {word}"))
}

//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an item count with the right noun, e.g. `1 item`, `3 items`.
///
/// Usage in templates: `{{ cart.item_count|item_label }}`
#[askama::filter_fn]
pub fn item_label(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(pluralize_items(&count.to_string()))
}

fn pluralize_items(count: &str) -> String {
    let noun = if count == "1" { "item" } else { "items" };
    format!("{count} {noun}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize_items() {
        assert_eq!(pluralize_items("1"), "1 item");
        assert_eq!(pluralize_items("0"), "0 items");
        assert_eq!(pluralize_items("12"), "12 items");
    }
}

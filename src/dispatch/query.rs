use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;

static FILTER_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^filter\[(.+)\]$").expect("filter key pattern"));

/// Requested page number, 1-based, default 1. Later duplicates win, matching
/// the filter semantics below.
pub fn page(query: &[(String, String)]) -> Result<u64, ApiError> {
    let raw = query
        .iter()
        .rev()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str())
        .unwrap_or("1");

    let page: u64 = raw.parse().map_err(|_| {
        ApiError::validation_error(format!("page must be a positive integer, got '{}'", raw), None)
    })?;
    if page < 1 {
        return Err(ApiError::validation_error("page must be 1 or greater", None));
    }
    Ok(page)
}

/// Field filters from `filter[<field>]=<value>` query keys. Repeated keys for
/// the same field overwrite earlier ones; anything else in the query string is
/// ignored.
pub fn parse_filter(query: &[(String, String)]) -> HashMap<String, String> {
    let mut filter = HashMap::new();
    for (key, value) in query {
        if let Some(caps) = FILTER_KEY.captures(key) {
            filter.insert(caps[1].to_string(), value.clone());
        }
    }
    filter
}

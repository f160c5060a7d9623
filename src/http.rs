//! Small shared helpers for the HTTP layer: boolean query-param parsing per
//! spec §6.1 (`true|t|yes|y|1`, case-insensitive; anything else is false).

use std::collections::HashMap;

pub fn str_to_bool(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1"
    )
}

pub fn query_bool(params: &HashMap<String, String>, key: &str, default: bool) -> bool {
    params
        .get(key)
        .map(|v| str_to_bool(v))
        .unwrap_or(default)
}

pub fn query_str<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|s| s.as_str())
}

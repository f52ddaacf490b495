//! Placeholder detection and secret-name heuristics
//!
//! [`is_placeholder`] is the one test used everywhere a value has to be
//! classified as "needs a real secret": validation, vault merge, sanitizing
//! and the preserve-existing-secrets merge all call it.

use serde_json::Value;

/// Markers matched case-insensitively anywhere in a value.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "YOUR_API_KEY_HERE",
    "YOUR_",
    "REPLACE_ME",
    "PLACEHOLDER",
    "API_KEY_HERE",
    "<YOUR_",
    "[YOUR_",
];

/// Name fragments that mark a variable as credential-bearing for validation.
const CREDENTIAL_NAME_MARKERS: &[&str] = &["API", "KEY", "TOKEN", "SECRET", "PASSWORD", "AUTH"];

/// Name fragments that mark a variable as secret for extraction and masking.
const SECRET_NAME_MARKERS: &[&str] = &["API", "KEY", "TOKEN", "SECRET", "PASS"];

/// Whether a string value is a placeholder.
pub fn is_placeholder_str(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let upper = value.to_uppercase();
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| upper.contains(marker))
}

/// Whether a JSON value is a placeholder. Non-strings never are.
pub fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => is_placeholder_str(s),
        _ => false,
    }
}

/// Variable names that the secret heuristics in validation inspect.
pub fn looks_like_credential(name: &str) -> bool {
    let upper = name.to_uppercase();
    CREDENTIAL_NAME_MARKERS.iter().any(|m| upper.contains(m))
}

/// Variable names whose values are extracted, sanitized and masked.
pub fn is_secret_like(name: &str) -> bool {
    let upper = name.to_uppercase();
    SECRET_NAME_MARKERS.iter().any(|m| upper.contains(m))
}

/// Descriptive placeholder written in place of a real secret.
pub fn placeholder_for(name: &str) -> String {
    let upper = name.to_uppercase();
    if upper.contains("API_KEY") {
        "YOUR_API_KEY_HERE".to_string()
    } else if upper.contains("TOKEN") {
        "YOUR_TOKEN_HERE".to_string()
    } else if upper.contains("SECRET") {
        "YOUR_SECRET_HERE".to_string()
    } else {
        format!("YOUR_{name}_HERE")
    }
}

//! JSON payload extraction from free-form model output.
//!
//! Models asked for "only JSON" still wrap it in prose or code fences, so every
//! stage parses the span from the first `{` to the last `}` and nothing else.

use serde::de::DeserializeOwned;

use slidesmith_shared::{Result, SlidesmithError};

/// Longest slice of a response quoted in parse errors.
const MAX_QUOTED: usize = 120;

/// Return the substring from the first `{` through the last `}`.
///
/// Fails when either brace is missing or the last `}` precedes the first `{`.
pub fn extract_json_object(text: &str) -> Result<&str> {
    let start = text.find('{');
    let end = text.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(SlidesmithError::parse(format!(
            "no JSON object in model response: {}",
            quote(text)
        ))),
    }
}

/// Extract the embedded object and deserialize it into `T`.
pub fn parse_embedded<T: DeserializeOwned>(text: &str) -> Result<T> {
    let json = extract_json_object(text)?;
    serde_json::from_str(json).map_err(|e| {
        SlidesmithError::parse(format!("model response is not the expected JSON: {e}"))
    })
}

fn quote(text: &str) -> String {
    let mut quoted: String = text.chars().take(MAX_QUOTED).collect();
    if text.chars().count() > MAX_QUOTED {
        quoted.push_str("...");
    }
    quoted
}

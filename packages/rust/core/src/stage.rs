//! The model call shared by every stage: prompt, bounded wait, extraction, parse.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use slidesmith_provider::CompletionProvider;
use slidesmith_shared::{Result, SlidesmithError};

use crate::extract;
use crate::prompts::StageConfig;

/// Call the model for one stage and parse its reply into `T`.
///
/// A call exceeding `timeout` fails like any other provider error.
pub(crate) async fn ask<T: DeserializeOwned>(
    provider: &dyn CompletionProvider,
    stage: &StageConfig,
    vars: &[(&str, &str)],
    timeout: Duration,
) -> Result<T> {
    let request = stage.request(vars);

    let text = match tokio::time::timeout(timeout, provider.complete(&request)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(SlidesmithError::Provider(format!(
                "model call timed out after {:.1}s",
                timeout.as_secs_f64()
            )));
        }
    };

    debug!(model = %request.model, chars = text.len(), "stage response received");
    extract::parse_embedded(&text)
}

/// Bullets as a Markdown list for prompts.
pub(crate) fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".into();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim every item and drop the blank ones.
pub(crate) fn clean_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Trimmed text, or `None` when blank.
pub(crate) fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

//! Slide condensing: shrink a researched slide to a few dense bullets.
//!
//! Condensing never fails from the caller's point of view. Every error,
//! quota exhaustion included, hands back the researched slide unchanged.

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use slidesmith_provider::CompletionProvider;
use slidesmith_shared::Slide;

use crate::prompts::PipelineConfig;
use crate::stage::{self, bullet_list, clean_items, clean_text};

/// Most bullets a condensed slide keeps.
pub const MAX_CONDENSED_BULLETS: usize = 4;

/// `key_reference` values that mean "no reference".
const NO_REFERENCE: &[&str] = &["none", "n/a", "na", "null", "no reference", "-"];

#[derive(Debug, Deserialize)]
struct CondenseResponse {
    #[serde(default)]
    concise_bullet_points: Option<Vec<String>>,
    #[serde(default)]
    concise_notes: Option<String>,
    #[serde(default)]
    key_reference: Option<String>,
}

/// Condense a researched slide.
///
/// Slides that never went through research pass through untouched.
#[instrument(skip_all, fields(slide = %slide.title))]
pub async fn condense(
    provider: &dyn CompletionProvider,
    config: &PipelineConfig,
    slide: Slide,
) -> Slide {
    if !slide.researched {
        debug!("slide not researched, skipping condense");
        return slide;
    }

    let content = bullet_list(&slide.content);
    let notes = slide.notes_text().unwrap_or("(none)").to_string();
    let references = slide
        .references
        .as_deref()
        .map(bullet_list)
        .unwrap_or_else(|| "(none)".into());

    let reply = stage::ask::<CondenseResponse>(
        provider,
        &config.condenser,
        &[
            ("title", slide.title.as_str()),
            ("content", content.as_str()),
            ("notes", notes.as_str()),
            ("references", references.as_str()),
        ],
        config.request_timeout,
    )
    .await;

    match reply {
        Ok(response) => apply(slide, response),
        Err(e) => {
            warn!(error = %e, quota = e.is_quota_exceeded(), "condense failed, keeping researched slide");
            slide
        }
    }
}

fn apply(slide: Slide, response: CondenseResponse) -> Slide {
    let mut bullets = clean_items(response.concise_bullet_points.unwrap_or_default());
    if bullets.is_empty() {
        warn!(slide = %slide.title, "condense returned no bullet points, keeping slide");
        return slide;
    }
    bullets.truncate(MAX_CONDENSED_BULLETS);

    let mut notes = clean_text(response.concise_notes)
        .or_else(|| slide.notes_text().map(|n| n.trim().to_string()));

    if let Some(reference) = clean_text(response.key_reference).filter(|r| !is_placeholder(r)) {
        let line = format!("Reference: {reference}");
        notes = Some(match notes {
            Some(text) => format!("{text}\n\n{line}"),
            None => line,
        });
    }

    debug!(bullets = bullets.len(), "slide condensed");

    Slide {
        title: slide.title,
        content: bullets,
        notes,
        references: None,
        researched: true,
    }
}

fn is_placeholder(reference: &str) -> bool {
    let normalized = reference
        .trim_matches(|c: char| c.is_ascii_punctuation() && c != '-')
        .trim()
        .to_ascii_lowercase();
    NO_REFERENCE.contains(&normalized.as_str())
}

//! Outline drafting: topic in, validated outline out.
//!
//! Any failure except quota exhaustion degrades to a fixed three-slide
//! outline built from the topic, so the caller always gets a renderable deck.

use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use slidesmith_provider::CompletionProvider;
use slidesmith_shared::{Outline, Result, Slide, SlidesmithError};

use crate::prompts::PipelineConfig;
use crate::stage::{self, clean_items, clean_text};

/// Outline shape the model is asked to produce.
#[derive(Debug, Deserialize)]
struct DraftResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slides: Option<Vec<Option<DraftSlide>>>,
}

#[derive(Debug, Deserialize)]
struct DraftSlide {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<Vec<String>>,
    #[serde(default)]
    notes: Option<String>,
}

/// Draft an outline for `topic`.
///
/// Returns `Err` only for [`SlidesmithError::QuotaExceeded`].
#[instrument(skip_all, fields(topic = %topic))]
pub async fn draft(
    provider: &dyn CompletionProvider,
    config: &PipelineConfig,
    topic: &str,
) -> Result<Outline> {
    let reply = stage::ask::<DraftResponse>(
        provider,
        &config.drafter,
        &[("topic", topic)],
        config.request_timeout,
    )
    .await;

    let outline = match reply.and_then(validate) {
        Ok(outline) => outline,
        Err(e) if e.is_quota_exceeded() => {
            error!(error = %e, "outline draft hit provider quota");
            return Err(e);
        }
        Err(e) => {
            warn!(error = %e, "outline draft failed, using fallback outline");
            return Ok(fallback_outline(topic));
        }
    };

    info!(title = %outline.title, slides = outline.slides.len(), "outline drafted");
    Ok(outline)
}

/// Normalize a drafted outline.
///
/// Bullets are trimmed and blank ones removed; slides left without a title or
/// without bullets are dropped. An outline with no title or no surviving
/// slides is a parse failure.
fn validate(response: DraftResponse) -> Result<Outline> {
    let title = response.title.unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return Err(SlidesmithError::parse("drafted outline has no title"));
    }

    let drafted = response.slides.unwrap_or_default();
    let mut slides = Vec::with_capacity(drafted.len());
    for (index, draft) in drafted.into_iter().enumerate() {
        let Some(draft) = draft else {
            warn!(index, "dropping null drafted slide");
            continue;
        };
        let slide_title = draft.title.unwrap_or_default().trim().to_string();
        let content = clean_items(draft.content.unwrap_or_default());

        if slide_title.is_empty() || content.is_empty() {
            warn!(index, title = %slide_title, "dropping incomplete drafted slide");
            continue;
        }

        slides.push(Slide {
            title: slide_title,
            content,
            notes: clean_text(draft.notes),
            references: None,
            researched: false,
        });
    }

    if slides.is_empty() {
        return Err(SlidesmithError::parse("drafted outline has no usable slides"));
    }

    Ok(Outline { title, slides })
}

/// The outline used when drafting fails.
pub fn fallback_outline(topic: &str) -> Outline {
    Outline {
        title: format!("Presentation about {}", topic.trim()),
        slides: vec![
            Slide::new(
                "Introduction",
                ["Overview of the topic", "Key points to be covered"],
                Some("Introduce yourself and the topic"),
            ),
            Slide::new(
                "Key Points",
                ["Main idea 1", "Main idea 2", "Main idea 3"],
                Some("Explain the main concepts"),
            ),
            Slide::new(
                "Conclusion",
                ["Summary of key points", "Call to action or next steps"],
                Some("Wrap up and invite questions"),
            ),
        ],
    }
}

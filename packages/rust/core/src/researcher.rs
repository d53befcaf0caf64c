//! Slide research: expand one slide with facts, notes, and references.

use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

use slidesmith_provider::CompletionProvider;
use slidesmith_shared::{Result, Slide};

use crate::prompts::PipelineConfig;
use crate::stage::{self, bullet_list, clean_items, clean_text};

#[derive(Debug, Deserialize)]
struct ResearchResponse {
    #[serde(default)]
    bullet_points: Option<Vec<String>>,
    #[serde(default)]
    presenter_notes: Option<String>,
    #[serde(default)]
    references: Option<Vec<String>>,
}

/// Research `slide` in the context of `topic`.
///
/// On success the slide's bullets are replaced, presenter notes are appended
/// to any existing notes, references are attached, and the slide is marked
/// researched. Any failure other than quota exhaustion returns the slide
/// unchanged.
#[instrument(skip_all, fields(slide = %slide.title))]
pub async fn research(
    provider: &dyn CompletionProvider,
    config: &PipelineConfig,
    slide: Slide,
    topic: &str,
) -> Result<Slide> {
    let content = bullet_list(&slide.content);
    let reply = stage::ask::<ResearchResponse>(
        provider,
        &config.researcher,
        &[
            ("topic", topic),
            ("title", slide.title.as_str()),
            ("content", content.as_str()),
        ],
        config.request_timeout,
    )
    .await;

    match reply {
        Ok(response) => Ok(apply(slide, response)),
        Err(e) if e.is_quota_exceeded() => {
            error!(error = %e, "slide research hit provider quota");
            Err(e)
        }
        Err(e) => {
            warn!(error = %e, "slide research failed, keeping slide as drafted");
            Ok(slide)
        }
    }
}

fn apply(slide: Slide, response: ResearchResponse) -> Slide {
    let bullets = clean_items(response.bullet_points.unwrap_or_default());
    if bullets.is_empty() {
        warn!(slide = %slide.title, "research returned no bullet points, keeping slide");
        return slide;
    }

    let notes = match (slide.notes_text(), clean_text(response.presenter_notes)) {
        (Some(existing), Some(added)) => Some(format!("{}\n\n{added}", existing.trim())),
        (None, Some(added)) => Some(added),
        (existing, None) => existing.map(str::to_string),
    };

    let references = clean_items(response.references.unwrap_or_default());
    debug!(bullets = bullets.len(), references = references.len(), "slide researched");

    Slide {
        title: slide.title,
        content: bullets,
        notes,
        references: if references.is_empty() {
            slide.references
        } else {
            Some(references)
        },
        researched: true,
    }
}

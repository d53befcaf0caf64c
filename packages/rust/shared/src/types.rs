//! Core domain types: the deck outline handed from the pipeline to rendering.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outline
// ---------------------------------------------------------------------------

/// A structured presentation outline.
///
/// Slide order is presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Deck title.
    pub title: String,
    /// Slides, top to bottom.
    pub slides: Vec<Slide>,
}

impl Outline {
    /// Total number of bullets across all slides.
    pub fn bullet_count(&self) -> usize {
        self.slides.iter().map(|s| s.content.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Slide
// ---------------------------------------------------------------------------

/// A single slide of an [`Outline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Slide title.
    pub title: String,
    /// Bullet points in presentation order.
    #[serde(default)]
    pub content: Vec<String>,
    /// Speaker notes. `None` or empty means no notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Citations collected by the research stage; consumed by condensing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    /// Set once the research stage has rewritten this slide.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub researched: bool,
}

impl Slide {
    /// Create an unresearched slide with the given title, bullets, and notes.
    pub fn new(
        title: impl Into<String>,
        content: impl IntoIterator<Item = impl Into<String>>,
        notes: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into_iter().map(Into::into).collect(),
            notes: notes.map(str::to_string),
            references: None,
            researched: false,
        }
    }

    /// Speaker notes, if present and non-blank.
    pub fn notes_text(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.trim().is_empty())
    }
}

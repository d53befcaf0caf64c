//! Deck renderers.
//!
//! Pure functions turning an [`Outline`] into deck text. Nothing here touches
//! the filesystem; `slidesmith-core` decides where the output lands.

use std::str::FromStr;

use slidesmith_shared::{Outline, Result, SlidesmithError};

/// Subtitle placed on the title slide.
const TITLE_SLIDE_SUBTITLE: &str = "Generated Presentation";

/// Output format for a rendered deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckFormat {
    /// Marp-compatible Markdown slide deck.
    Markdown,
    /// The outline itself, pretty-printed.
    Json,
}

impl DeckFormat {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }

    /// Parse a comma-separated format list such as `markdown,json`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        let mut formats = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let format: Self = item.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        if formats.is_empty() {
            return Err(SlidesmithError::validation("no deck formats requested"));
        }
        Ok(formats)
    }
}

impl FromStr for DeckFormat {
    type Err = SlidesmithError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(SlidesmithError::validation(format!(
                "unknown deck format '{other}': expected 'markdown' or 'json'"
            ))),
        }
    }
}

impl std::fmt::Display for DeckFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Render an outline in the given format.
pub fn render(outline: &Outline, format: DeckFormat) -> Result<String> {
    match format {
        DeckFormat::Markdown => Ok(render_markdown(outline)),
        DeckFormat::Json => render_json(outline),
    }
}

/// Render a Marp-style Markdown deck.
///
/// A title slide comes first, then one `---`-separated slide per outline slide.
/// Speaker notes go in an HTML comment after the bullets, which Marp treats
/// as presenter notes.
pub fn render_markdown(outline: &Outline) -> String {
    let mut out = String::new();

    out.push_str("---\nmarp: true\n---\n\n");
    out.push_str(&format!(
        "# {}\n\n{TITLE_SLIDE_SUBTITLE}\n",
        single_line(&outline.title)
    ));

    for slide in &outline.slides {
        out.push_str(&format!("\n---\n\n## {}\n\n", single_line(&slide.title)));

        for bullet in &slide.content {
            out.push_str(&format!("- {}\n", single_line(bullet)));
        }

        if let Some(notes) = slide.notes_text() {
            out.push_str(&format!(
                "\n<!--\n{}\n-->\n",
                notes.trim().replace("-->", "--&gt;")
            ));
        }
    }

    out
}

/// Render the outline as pretty JSON.
pub fn render_json(outline: &Outline) -> Result<String> {
    serde_json::to_string_pretty(outline)
        .map_err(|e| SlidesmithError::validation(format!("JSON serialization failed: {e}")))
}

/// Collapse internal line breaks so a value stays on one Markdown line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use slidesmith_shared::Slide;

    use super::*;

    fn outline() -> Outline {
        Outline {
            title: "History of Chess".into(),
            slides: vec![
                Slide::new(
                    "Origins",
                    ["Chaturanga in 6th-century India", "Spread via Persia"],
                    Some("Mention shatranj."),
                ),
                Slide::new("Modern Era", ["FIDE founded 1924"], None),
            ],
        }
    }

    #[test]
    fn markdown_exact_layout() {
        let outline = Outline {
            title: "Chess".into(),
            slides: vec![Slide::new("Origins", ["India", "Persia"], Some("Roots."))],
        };
        let expected = "---\nmarp: true\n---\n\n# Chess\n\nGenerated Presentation\n\n---\n\n## Origins\n\n- India\n- Persia\n\n<!--\nRoots.\n-->\n";
        assert_eq!(render_markdown(&outline), expected);
    }

    #[test]
    fn markdown_has_title_slide_and_separators() {
        let md = render_markdown(&outline());
        assert!(md.starts_with("---\nmarp: true\n---\n\n# History of Chess\n"));
        assert!(md.contains(TITLE_SLIDE_SUBTITLE));
        // front matter fence pair + one separator per slide
        assert_eq!(md.matches("\n---\n").count(), 3);
    }

    #[test]
    fn markdown_keeps_slide_and_bullet_order() {
        let md = render_markdown(&outline());
        let origins = md.find("## Origins").unwrap();
        let modern = md.find("## Modern Era").unwrap();
        assert!(origins < modern);

        let first = md.find("- Chaturanga").unwrap();
        let second = md.find("- Spread via Persia").unwrap();
        assert!(first < second);
    }

    #[test]
    fn markdown_notes_become_comments() {
        let md = render_markdown(&outline());
        assert!(md.contains("<!--\nMention shatranj.\n-->"));
        assert_eq!(md.matches("<!--").count(), 1);
    }

    #[test]
    fn markdown_escapes_comment_terminator_in_notes() {
        let mut deck = outline();
        deck.slides[1].notes = Some("a --> b".into());
        let md = render_markdown(&deck);
        assert!(md.contains("a --&gt; b"));
    }

    #[test]
    fn multiline_bullets_are_flattened() {
        let mut deck = outline();
        deck.slides[1].content = vec!["line one\nline two".into()];
        let md = render_markdown(&deck);
        assert!(md.contains("- line one line two"));
    }

    #[test]
    fn json_matches_outline() {
        let deck = outline();
        let json = render_json(&deck).unwrap();
        let parsed: Outline = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, deck);
    }

    #[test]
    fn format_list_parsing() {
        assert_eq!(
            DeckFormat::parse_list("markdown, json,md").unwrap(),
            vec![DeckFormat::Markdown, DeckFormat::Json]
        );
        assert!(DeckFormat::parse_list("pptx").is_err());
        assert!(DeckFormat::parse_list(" , ").is_err());
    }
}

//! Stage configuration records and the default prompts.
//!
//! Every model call the pipeline makes is described by a [`StageConfig`]:
//! model, temperature, system prompt, and a user template with `{name}`
//! placeholders. [`PipelineConfig`] bundles one per stage plus pacing and
//! timeout, and is immutable once the pipeline is built.

use std::time::Duration;

use slidesmith_provider::CompletionRequest;
use slidesmith_shared::AppConfig;

// ---------------------------------------------------------------------------
// Default prompts
// ---------------------------------------------------------------------------

/// System prompt for the outline draft.
pub const DRAFT_SYSTEM_PROMPT: &str = r#"You are an expert presentation designer.
Create a detailed presentation outline with exactly the following JSON structure:
{
    "title": "Main Presentation Title",
    "slides": [
        {
            "title": "Slide Title",
            "content": ["Bullet point 1", "Bullet point 2", "Bullet point 3"],
            "notes": "Optional presenter notes"
        }
    ]
}

Follow these guidelines:
- Create 5-10 slides depending on the topic complexity
- Include an introduction, main content slides, and a conclusion
- Keep bullet points concise and focused (1-2 lines each)
- Add presenter notes to provide additional context
- Ensure logical flow between slides
- ONLY output valid JSON that matches the structure above"#;

/// User template for the outline draft. Placeholders: `{topic}`.
pub const DRAFT_USER_TEMPLATE: &str = "Generate a presentation outline about: {topic}";

/// System prompt for slide research.
pub const RESEARCH_SYSTEM_PROMPT: &str = r#"You are a meticulous research assistant preparing presentation slides.
Respond ONLY with a JSON object of this shape:
{
    "bullet_points": ["Enhanced bullet point", "..."],
    "presenter_notes": "Detailed notes for the presenter",
    "references": ["Source or citation", "..."]
}"#;

/// User template for slide research.
/// Placeholders: `{topic}`, `{title}`, `{content}`.
pub const RESEARCH_USER_TEMPLATE: &str = r#"Presentation topic: {topic}
Slide title: {title}
Current content:
{content}

Research this slide and produce:
- 3-6 enhanced bullet points grounded in specific facts, data, or examples
- detailed presenter notes expanding on each point
- optional references (sources or citations) that support the content

Return JSON with the fields "bullet_points", "presenter_notes", and "references"."#;

/// System prompt for slide condensing.
pub const CONDENSE_SYSTEM_PROMPT: &str = r#"You are an expert editor who makes presentation slides concise and information-dense.
Respond ONLY with a JSON object of this shape:
{
    "concise_bullet_points": ["Short bullet", "..."],
    "concise_notes": "Two or three sentences for the presenter",
    "key_reference": "The single most important reference, or \"none\""
}"#;

/// User template for slide condensing.
/// Placeholders: `{title}`, `{content}`, `{notes}`, `{references}`.
pub const CONDENSE_USER_TEMPLATE: &str = r#"Slide title: {title}
Researched bullet points:
{content}

Presenter notes:
{notes}

References:
{references}

Condense this slide:
- at most 3-4 bullet points, each no longer than 15 words
- presenter notes of at most 2-3 sentences
- keep at most one key reference, or "none"

Return JSON with the fields "concise_bullet_points", "concise_notes", and "key_reference"."#;

// ---------------------------------------------------------------------------
// StageConfig
// ---------------------------------------------------------------------------

/// Model call settings for one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    /// Provider model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// System instruction.
    pub system_prompt: String,
    /// User instruction with `{name}` placeholders.
    pub user_template: String,
}

impl StageConfig {
    /// Build the completion request for this stage.
    pub fn request(&self, vars: &[(&str, &str)]) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            user: render_template(&self.user_template, vars),
            temperature: self.temperature,
        }
    }
}

/// Substitute `{name}` placeholders in one pass.
///
/// Unknown placeholders and stray braces are left as they are, and
/// substituted values are never rescanned.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Immutable configuration for an outline pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub drafter: StageConfig,
    pub researcher: StageConfig,
    pub condenser: StageConfig,
    /// Delay between refined slides. Zero disables pacing.
    pub pacing: Duration,
    /// Upper bound on a single model call.
    pub request_timeout: Duration,
}

impl PipelineConfig {
    /// Build the pipeline config from the loaded application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let model = &config.provider.default_model;
        let settings = &config.pipeline;

        Self {
            drafter: StageConfig {
                model: model.clone(),
                temperature: settings.draft_temperature,
                system_prompt: DRAFT_SYSTEM_PROMPT.into(),
                user_template: DRAFT_USER_TEMPLATE.into(),
            },
            researcher: StageConfig {
                model: model.clone(),
                temperature: settings.research_temperature,
                system_prompt: RESEARCH_SYSTEM_PROMPT.into(),
                user_template: RESEARCH_USER_TEMPLATE.into(),
            },
            condenser: StageConfig {
                model: model.clone(),
                temperature: settings.condense_temperature,
                system_prompt: CONDENSE_SYSTEM_PROMPT.into(),
                user_template: CONDENSE_USER_TEMPLATE.into(),
            },
            pacing: Duration::from_millis(settings.pacing_ms),
            request_timeout: Duration::from_secs(config.provider.timeout_secs),
        }
    }

    /// Use `model` for every stage.
    pub fn with_model(mut self, model: &str) -> Self {
        for stage in [&mut self.drafter, &mut self.researcher, &mut self.condenser] {
            stage.model = model.to_string();
        }
        self
    }

    /// Replace the inter-slide pacing delay.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

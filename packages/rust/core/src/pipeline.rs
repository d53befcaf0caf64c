//! End-to-end outline pipeline: topic → draft → (research → condense)* → outline.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use slidesmith_provider::CompletionProvider;
use slidesmith_shared::{Outline, Result, Slide, SlidesmithError};

use crate::prompts::PipelineConfig;
use crate::{condenser, drafter, researcher};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a slide has been researched and condensed.
    fn slide_refined(&self, title: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, outline: &Outline);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn slide_refined(&self, _title: &str, _current: usize, _total: usize) {}
    fn done(&self, _outline: &Outline) {}
}

/// The outline pipeline.
///
/// Holds the injected provider and an immutable [`PipelineConfig`]. Each
/// [`run`](Self::run) owns the outline it builds, so one pipeline can serve
/// concurrent requests.
#[derive(Clone)]
pub struct OutlinePipeline {
    provider: Arc<dyn CompletionProvider>,
    config: PipelineConfig,
}

impl OutlinePipeline {
    /// Create a pipeline over `provider`.
    pub fn new(provider: Arc<dyn CompletionProvider>, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Draft an outline. See [`drafter::draft`].
    pub async fn draft(&self, topic: &str) -> Result<Outline> {
        drafter::draft(self.provider.as_ref(), &self.config, topic).await
    }

    /// Research one slide. See [`researcher::research`].
    pub async fn research(&self, slide: Slide, topic: &str) -> Result<Slide> {
        researcher::research(self.provider.as_ref(), &self.config, slide, topic).await
    }

    /// Condense one slide. See [`condenser::condense`].
    pub async fn condense(&self, slide: Slide) -> Slide {
        condenser::condense(self.provider.as_ref(), &self.config, slide).await
    }

    /// Run the full pipeline for `topic`.
    ///
    /// 1. Draft the outline
    /// 2. If `enable_refinement`, research then condense each slide in order,
    ///    pausing `config.pacing` between slides
    ///
    /// Returns [`SlidesmithError::QuotaExceeded`] from drafting or research, or
    /// [`SlidesmithError::Cancelled`] once `cancel` fires. Nothing else escapes.
    #[instrument(skip_all, fields(topic = %topic, refine = enable_refinement))]
    pub async fn run(
        &self,
        topic: &str,
        enable_refinement: bool,
        cancel: &CancellationToken,
        progress: &dyn ProgressReporter,
    ) -> Result<Outline> {
        let start = Instant::now();

        progress.phase("Drafting outline");
        let mut outline = until_cancelled(cancel, self.draft(topic)).await?;

        if enable_refinement {
            let drafted = std::mem::take(&mut outline.slides);
            let total = drafted.len();
            let mut refined = Vec::with_capacity(total);

            for (index, slide) in drafted.into_iter().enumerate() {
                if index > 0 {
                    self.pace(cancel).await?;
                }

                progress.phase(&format!("Researching [{}/{total}] {}", index + 1, slide.title));
                let researched = until_cancelled(cancel, self.research(slide, topic)).await?;

                progress.phase(&format!("Condensing [{}/{total}] {}", index + 1, researched.title));
                let condensed =
                    until_cancelled(cancel, async { Ok(self.condense(researched).await) }).await?;

                progress.slide_refined(&condensed.title, index + 1, total);
                refined.push(condensed);
            }

            outline.slides = refined;
        }

        progress.done(&outline);

        info!(
            title = %outline.title,
            slides = outline.slides.len(),
            bullets = outline.bullet_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "outline pipeline complete"
        );

        Ok(outline)
    }

    /// Wait out the inter-slide delay, or stop early on cancellation.
    async fn pace(&self, cancel: &CancellationToken) -> Result<()> {
        if self.config.pacing.is_zero() {
            return check_cancelled(cancel);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SlidesmithError::Cancelled),
            _ = tokio::time::sleep(self.config.pacing) => Ok(()),
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(SlidesmithError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run `fut` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    check_cancelled(cancel)?;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SlidesmithError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::condenser::MAX_CONDENSED_BULLETS;
    use crate::test_support::{ScriptedProvider, quota_error, transport_error};

    const TOPIC: &str = "history of chess";

    const THREE_SLIDE_OUTLINE: &str = r#"{
        "title": "The History of Chess",
        "slides": [
            {"title": "Origins", "content": ["Chaturanga", "Shatranj"], "notes": "Ancient roots."},
            {"title": "Europe", "content": ["The queen grows stronger"], "notes": "Medieval era."},
            {"title": "Modern Chess", "content": ["FIDE", "Engines"], "notes": "Today."}
        ]
    }"#;

    const TWO_SLIDE_OUTLINE: &str = r#"Sure thing!
    {
        "title": "The History of Chess",
        "slides": [
            {"title": "Origins", "content": ["Chaturanga", "Shatranj"]},
            {"title": "Modern Chess", "content": ["FIDE", "Engines"]}
        ]
    }"#;

    fn research_reply(n: usize) -> Result<String> {
        let bullets: Vec<String> = (1..=n).map(|i| format!("Researched fact {i}")).collect();
        Ok(serde_json::json!({
            "bullet_points": bullets,
            "presenter_notes": "Detailed notes.",
            "references": ["Murray (1913)"],
        })
        .to_string())
    }

    fn condense_reply(tag: &str) -> Result<String> {
        Ok(serde_json::json!({
            "concise_bullet_points": [format!("{tag} one"), format!("{tag} two"), format!("{tag} three")],
            "concise_notes": format!("{tag} in brief."),
            "key_reference": "none",
        })
        .to_string())
    }

    fn pipeline(provider: Arc<ScriptedProvider>) -> OutlinePipeline {
        let config = PipelineConfig::default().with_pacing(Duration::ZERO);
        OutlinePipeline::new(provider, config)
    }

    /// Records every progress callback.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn slide_refined(&self, title: &str, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("refined:{current}/{total}:{title}"));
        }
        fn done(&self, outline: &Outline) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", outline.slides.len()));
        }
    }

    #[tokio::test]
    async fn without_refinement_returns_draft_unchanged() {
        let provider = Arc::new(ScriptedProvider::new([Ok(THREE_SLIDE_OUTLINE.into())]));
        let pipeline = pipeline(provider.clone());

        let outline = pipeline
            .run(TOPIC, false, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap();

        let expected = pipeline_draft_of(THREE_SLIDE_OUTLINE).await;
        assert_eq!(outline, expected);
        assert_eq!(provider.call_count(), 1, "no research or condense calls");
    }

    /// The outline the drafter alone produces for `reply`.
    async fn pipeline_draft_of(reply: &str) -> Outline {
        let provider = Arc::new(ScriptedProvider::new([Ok(reply.to_string())]));
        pipeline(provider).draft(TOPIC).await.unwrap()
    }

    #[tokio::test]
    async fn refinement_condenses_every_slide_in_order() {
        let provider = Arc::new(ScriptedProvider::new([
            Ok(TWO_SLIDE_OUTLINE.into()),
            research_reply(6),
            condense_reply("Origins"),
            research_reply(5),
            condense_reply("Modern"),
        ]));
        let pipeline = pipeline(provider.clone());
        let progress = RecordingProgress::default();

        let outline = pipeline
            .run(TOPIC, true, &CancellationToken::new(), &progress)
            .await
            .unwrap();

        assert_eq!(outline.title, "The History of Chess");
        assert_eq!(outline.slides.len(), 2);
        assert_eq!(outline.slides[0].title, "Origins");
        assert_eq!(outline.slides[1].title, "Modern Chess");
        assert_eq!(outline.slides[0].content[0], "Origins one");
        assert_eq!(outline.slides[1].content[0], "Modern one");
        for slide in &outline.slides {
            assert!(slide.content.len() <= MAX_CONDENSED_BULLETS);
            assert!(slide.notes_text().is_some());
            assert!(slide.references.is_none());
        }
        assert_eq!(provider.call_count(), 5);

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events.first().map(String::as_str), Some("phase:Drafting outline"));
        assert!(events.contains(&"refined:1/2:Origins".to_string()));
        assert!(events.contains(&"refined:2/2:Modern Chess".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("done:2"));
    }

    #[tokio::test]
    async fn stage_requests_use_stage_settings() {
        let provider = Arc::new(ScriptedProvider::new([
            Ok(TWO_SLIDE_OUTLINE.into()),
            research_reply(3),
            condense_reply("a"),
            research_reply(3),
            condense_reply("b"),
        ]));
        let pipeline = pipeline(provider.clone());
        pipeline
            .run(TOPIC, true, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap();

        let calls = provider.calls();
        let config = pipeline.config();
        assert_eq!(calls[0].system, config.drafter.system_prompt);
        assert_eq!(calls[1].system, config.researcher.system_prompt);
        assert_eq!(calls[2].system, config.condenser.system_prompt);
        assert!((calls[2].temperature - config.condenser.temperature).abs() < f32::EPSILON);
        assert!(calls[3].user.contains("Slide title: Modern Chess"));
    }

    #[tokio::test]
    async fn draft_quota_stops_everything() {
        let provider = Arc::new(ScriptedProvider::new([quota_error()]));
        let pipeline = pipeline(provider.clone());

        let err = pipeline
            .run(TOPIC, true, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap_err();

        assert!(err.is_quota_exceeded());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn research_quota_aborts_refinement() {
        let provider = Arc::new(ScriptedProvider::new([
            Ok(TWO_SLIDE_OUTLINE.into()),
            research_reply(4),
            condense_reply("Origins"),
            quota_error(),
        ]));
        let pipeline = pipeline(provider.clone());

        let err = pipeline
            .run(TOPIC, true, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap_err();

        assert!(err.is_quota_exceeded());
        assert_eq!(provider.call_count(), 4, "no condense after quota failure");
    }

    #[tokio::test]
    async fn failed_refinement_calls_degrade_per_slide() {
        let provider = Arc::new(ScriptedProvider::new([
            Ok(TWO_SLIDE_OUTLINE.into()),
            transport_error(),
            research_reply(5),
            quota_error(),
        ]));
        let pipeline = pipeline(provider.clone());

        let outline = pipeline
            .run(TOPIC, true, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap();

        // Slide 1: research failed, condense skipped because it was never researched.
        assert_eq!(outline.slides[0].content, vec!["Chaturanga", "Shatranj"]);
        assert!(!outline.slides[0].researched);
        // Slide 2: research succeeded, condense hit quota and kept the research.
        assert_eq!(outline.slides[1].content.len(), 5);
        assert!(outline.slides[1].researched);
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn drafter_failure_yields_fallback_outline() {
        let provider = Arc::new(ScriptedProvider::new([transport_error()]));
        let outline = pipeline(provider)
            .run(TOPIC, false, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(outline, drafter::fallback_outline(TOPIC));
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::new([Ok(THREE_SLIDE_OUTLINE.into())]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline(provider.clone())
            .run(TOPIC, true, &cancel, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, SlidesmithError::Cancelled));
        assert_eq!(provider.call_count(), 0);
    }

    /// Cancels the run as soon as the first slide is refined.
    struct CancelAfterFirstSlide(CancellationToken);

    impl ProgressReporter for CancelAfterFirstSlide {
        fn phase(&self, _name: &str) {}
        fn slide_refined(&self, _title: &str, _current: usize, _total: usize) {
            self.0.cancel();
        }
        fn done(&self, _outline: &Outline) {}
    }

    #[tokio::test]
    async fn cancellation_between_slides_stops_refinement() {
        let provider = Arc::new(ScriptedProvider::new([
            Ok(THREE_SLIDE_OUTLINE.into()),
            research_reply(4),
            condense_reply("a"),
        ]));
        let cancel = CancellationToken::new();
        let config = PipelineConfig::default().with_pacing(Duration::from_secs(30));
        let pipeline = OutlinePipeline::new(provider.clone(), config);

        let err = pipeline
            .run(TOPIC, true, &cancel, &CancelAfterFirstSlide(cancel.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, SlidesmithError::Cancelled));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn pacing_spaces_out_slides() {
        let provider = Arc::new(ScriptedProvider::new([
            Ok(TWO_SLIDE_OUTLINE.into()),
            research_reply(3),
            condense_reply("a"),
            research_reply(3),
            condense_reply("b"),
        ]));
        let config = PipelineConfig::default().with_pacing(Duration::from_millis(50));
        let pipeline = OutlinePipeline::new(provider, config);

        let start = Instant::now();
        pipeline
            .run(TOPIC, true, &CancellationToken::new(), &SilentProgress)
            .await
            .unwrap();
        // One pause between two slides, none after the last.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(2_000));
    }
}

//! Deck assembler.
//!
//! Takes a finished outline, renders it in the requested formats, and writes
//! the files plus a manifest into the output directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use slidesmith_artifacts::DeckFormat;
use slidesmith_shared::{Outline, Result, SlidesmithError};

/// File name prefix for generated decks.
const FILE_PREFIX: &str = "presentation";

/// Length of the random deck id used in file names.
const DECK_ID_LEN: usize = 8;

/// Facts about how a deck was produced, recorded in its manifest.
#[derive(Debug, Clone)]
pub struct DeckMeta {
    /// The topic the user asked for.
    pub topic: String,
    /// Model that drafted the outline.
    pub model: String,
    /// Whether research/condense ran.
    pub refined: bool,
    /// Tool version string.
    pub tool_version: String,
}

/// Metadata for a single written deck file.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub format: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `presentation_<id>.manifest.json` structure.
#[derive(Debug, Clone, Serialize)]
pub struct DeckManifest {
    pub deck_id: String,
    pub title: String,
    pub topic: String,
    pub model: String,
    pub refined: bool,
    pub slide_count: usize,
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<ArtifactMeta>,
}

/// Output from a successful deck assembly.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    /// Short random id shared by every file of this deck.
    pub deck_id: String,
    /// Written deck files, in the order formats were requested.
    pub files: Vec<PathBuf>,
    /// Path to the manifest.
    pub manifest_path: PathBuf,
}

/// Write `outline` to `output_dir` in each of `formats`.
///
/// Creates the following files:
/// ```text
/// <output_dir>/
/// ├── presentation_<id>.md
/// ├── presentation_<id>.json
/// └── presentation_<id>.manifest.json
/// ```
/// Each file is written to a temp name first and renamed into place.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), formats = formats.len()))]
pub fn assemble_deck(
    output_dir: &Path,
    outline: &Outline,
    formats: &[DeckFormat],
    meta: &DeckMeta,
) -> Result<AssembleResult> {
    if formats.is_empty() {
        return Err(SlidesmithError::validation("no deck formats requested"));
    }

    std::fs::create_dir_all(output_dir).map_err(|e| SlidesmithError::io(output_dir, e))?;

    let deck_id = new_deck_id();
    let mut files = Vec::with_capacity(formats.len());
    let mut artifacts = Vec::with_capacity(formats.len());

    for format in formats {
        let content = slidesmith_artifacts::render(outline, *format)?;
        let filename = format!("{FILE_PREFIX}_{deck_id}.{}", format.extension());
        let path = output_dir.join(&filename);

        write_atomic(&path, &content)?;
        debug!(file = %filename, size = content.len(), "wrote deck file");

        artifacts.push(ArtifactMeta {
            filename,
            format: format.to_string(),
            sha256: sha256_hex(&content),
            size_bytes: content.len(),
        });
        files.push(path);
    }

    let manifest = DeckManifest {
        deck_id: deck_id.clone(),
        title: outline.title.clone(),
        topic: meta.topic.clone(),
        model: meta.model.clone(),
        refined: meta.refined,
        slide_count: outline.slides.len(),
        tool_version: meta.tool_version.clone(),
        generated_at: Utc::now(),
        artifacts,
    };

    let manifest_path = output_dir.join(format!("{FILE_PREFIX}_{deck_id}.manifest.json"));
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| {
        SlidesmithError::validation(format!("JSON serialization failed: {e}"))
    })?;
    write_atomic(&manifest_path, &json)?;

    info!(%deck_id, files = files.len(), "deck assembly complete");

    Ok(AssembleResult {
        deck_id,
        files,
        manifest_path,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_deck_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(DECK_ID_LEN);
    id
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Write to a dot-prefixed temp file next to `path`, then rename over it.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SlidesmithError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(SlidesmithError::io(&temp, e));
    }
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(SlidesmithError::io(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

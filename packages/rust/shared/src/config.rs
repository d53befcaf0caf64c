//! Application configuration for Slidesmith.
//!
//! User config lives at `~/.slidesmith/slidesmith.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SlidesmithError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "slidesmith.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".slidesmith";

// ---------------------------------------------------------------------------
// Config structs (matching slidesmith.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language-model provider settings.
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Outline pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory generated decks are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Run the research/condense refinement by default.
    #[serde(default)]
    pub research: bool,

    /// Deck formats to write ("markdown", "json").
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            research: false,
            formats: default_formats(),
        }
    }
}

fn default_output_dir() -> String {
    "generated".into()
}
fn default_formats() -> Vec<String> {
    vec!["markdown".into(), "json".into()]
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used by every stage unless overridden.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            default_model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Sampling temperature for the outline draft.
    #[serde(default = "default_draft_temperature")]
    pub draft_temperature: f32,

    /// Sampling temperature for slide research.
    #[serde(default = "default_research_temperature")]
    pub research_temperature: f32,

    /// Sampling temperature for slide condensing.
    #[serde(default = "default_condense_temperature")]
    pub condense_temperature: f32,

    /// Delay between refined slides, in ms.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            draft_temperature: default_draft_temperature(),
            research_temperature: default_research_temperature(),
            condense_temperature: default_condense_temperature(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

fn default_draft_temperature() -> f32 {
    0.7
}
fn default_research_temperature() -> f32 {
    0.5
}
fn default_condense_temperature() -> f32 {
    0.3
}
fn default_pacing_ms() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Provider config (runtime, resolved from config + environment)
// ---------------------------------------------------------------------------

/// Runtime provider configuration, handed to the HTTP client at construction.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Bearer token.
    pub api_key: String,
    /// API base URL (e.g. `https://api.openai.com/v1`).
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve provider settings, reading the API key from the configured env var.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        validate_api_key(config)?;
        let api_key = std::env::var(&config.provider.api_key_env).unwrap_or_default();
        Self::new(
            api_key,
            &config.provider.base_url,
            Duration::from_secs(config.provider.timeout_secs),
        )
    }

    /// Build a provider config from explicit values.
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            SlidesmithError::config(format!("invalid provider base_url '{base_url}': {e}"))
        })?;
        Ok(Self {
            api_key: api_key.into(),
            base_url,
            timeout,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.slidesmith/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SlidesmithError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.slidesmith/slidesmith.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SlidesmithError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SlidesmithError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SlidesmithError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SlidesmithError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SlidesmithError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the provider API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.provider.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(()),
        _ => Err(SlidesmithError::config(format!(
            "provider API key not found. Set the {var_name} environment variable \
             (or put it in a .env file you export before running)."
        ))),
    }
}

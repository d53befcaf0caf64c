//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use slidesmith_artifacts::DeckFormat;
use slidesmith_core::assembler::{self, DeckMeta};
use slidesmith_core::{OutlinePipeline, PipelineConfig, ProgressReporter};
use slidesmith_provider::OpenAiProvider;
use slidesmith_shared::{
    AppConfig, Outline, ProviderConfig, SlidesmithError, config_file_path, init_config,
    load_config, validate_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Slidesmith: turn a topic into a slide deck.
#[derive(Parser)]
#[command(
    name = "slidesmith",
    version,
    about = "Generate slide decks from natural-language topics.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a deck for a topic.
    Generate {
        /// What the presentation is about.
        topic: String,

        /// Research and condense every slide (slower, more detailed).
        #[arg(short, long)]
        research: bool,

        /// Output directory (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<String>,

        /// Deck formats to write (comma-separated): markdown, json.
        #[arg(short, long)]
        format: Option<String>,

        /// Model to use for every stage (defaults to the configured model).
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Generate decks from prompts typed at the terminal.
    Interactive {
        /// Output directory (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Check that configuration and credentials are in place.
    Doctor,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "slidesmith=info",
        1 => "slidesmith=debug",
        _ => "slidesmith=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            topic,
            research,
            out,
            format,
            model,
        } => {
            cmd_generate(
                &topic,
                research,
                out.as_deref(),
                format.as_deref(),
                model.as_deref(),
            )
            .await
        }
        Command::Interactive { out } => cmd_interactive(out.as_deref()).await,
        Command::Doctor => cmd_doctor().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Everything needed to turn topics into decks on disk.
struct DeckSession {
    pipeline: OutlinePipeline,
    output_dir: PathBuf,
    formats: Vec<DeckFormat>,
}

impl DeckSession {
    /// Build the provider and pipeline from config and CLI overrides.
    fn new(
        config: &AppConfig,
        out: Option<&str>,
        format: Option<&str>,
        model: Option<&str>,
    ) -> Result<Self> {
        let provider_config = ProviderConfig::from_app_config(config)?;
        let provider = Arc::new(OpenAiProvider::new(&provider_config)?);

        let mut pipeline_config = PipelineConfig::from_app_config(config);
        if let Some(model) = model {
            pipeline_config = pipeline_config.with_model(model);
        }

        let formats = match format {
            Some(list) => DeckFormat::parse_list(list)?,
            None => DeckFormat::parse_list(&config.defaults.formats.join(","))?,
        };

        let output_dir = out
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

        Ok(Self {
            pipeline: OutlinePipeline::new(provider, pipeline_config),
            output_dir,
            formats,
        })
    }

    /// Run the pipeline for one topic and write the deck.
    async fn generate(&self, topic: &str, research: bool) -> Result<()> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(eyre!("topic must not be empty"));
        }

        info!(topic, research, "generating presentation");

        let cancel = CancellationToken::new();
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let reporter = CliProgress::new();
        let outcome = self.pipeline.run(topic, research, &cancel, &reporter).await;
        ctrl_c.abort();
        reporter.spinner.finish_and_clear();

        let outline = match outcome {
            Ok(outline) => outline,
            Err(SlidesmithError::Cancelled) => {
                println!("Generation cancelled.");
                return Ok(());
            }
            Err(e) if e.is_quota_exceeded() => {
                return Err(eyre!(
                    "{e}\nThe provider account cannot serve requests right now. \
                     Check the plan, billing, and rate limits for your API key, then retry."
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let meta = DeckMeta {
            topic: topic.to_string(),
            model: self.pipeline.config().drafter.model.clone(),
            refined: research,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let result = assembler::assemble_deck(&self.output_dir, &outline, &self.formats, &meta)?;

        print_summary(&outline, &result.files, &result.manifest_path);
        Ok(())
    }
}

async fn cmd_generate(
    topic: &str,
    research: bool,
    out: Option<&str>,
    format: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    let config = load_config()?;
    let session = DeckSession::new(&config, out, format, model)?;
    session
        .generate(topic, research || config.defaults.research)
        .await
}

async fn cmd_interactive(out: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let session = DeckSession::new(&config, out, None, None)?;

    println!("=== Slidesmith ===");
    println!("Describe the presentation you want to create.");
    println!("Type 'quit' or 'exit' to leave.");
    println!();

    loop {
        let Some(topic) = prompt_line("Prompt> ")? else {
            break;
        };

        if matches!(topic.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }
        if topic.is_empty() {
            println!("Please enter a prompt.");
            continue;
        }

        let default_hint = if config.defaults.research { "Y/n" } else { "y/N" };
        let answer = prompt_line(&format!(
            "Use research mode for enhanced content? ({default_hint}): "
        ))?
        .unwrap_or_default();
        let research = match answer.to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => config.defaults.research,
        };
        if research {
            println!("Research mode enabled. This takes longer but produces more detailed content.");
        }

        // A failed deck should not end the session.
        if let Err(e) = session.generate(&topic, research).await {
            eprintln!("Error: {e}");
        }
    }

    Ok(())
}

/// Print `label`, then read one trimmed line. `None` on end of input.
fn prompt_line(label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_summary(outline: &Outline, files: &[PathBuf], manifest: &Path) {
    println!();
    println!("  Presentation created successfully!");
    println!("  Title:    {}", outline.title);
    println!("  Slides:   {}", outline.slides.len());
    for file in files {
        println!("  File:     {}", file.display());
    }
    println!("  Manifest: {}", manifest.display());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn slide_refined(&self, title: &str, current: usize, total: usize) {
        self.spinner
            .println(format!("  refined [{current}/{total}] {title}"));
    }

    fn done(&self, _outline: &Outline) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Doctor
// ---------------------------------------------------------------------------

async fn cmd_doctor() -> Result<()> {
    let mut healthy = true;

    println!("Slidesmith {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Checking configuration:");

    let path = config_file_path()?;
    let config = if path.exists() {
        match load_config() {
            Ok(config) => {
                println!("  ✅ config file loaded: {}", path.display());
                config
            }
            Err(e) => {
                println!("  ❌ config file invalid: {e}");
                healthy = false;
                AppConfig::default()
            }
        }
    } else {
        println!("  ℹ️  no config file at {}, using defaults", path.display());
        AppConfig::default()
    };

    match validate_api_key(&config) {
        Ok(()) => println!("  ✅ {} is set", config.provider.api_key_env),
        Err(_) => {
            println!("  ❌ {} is not set", config.provider.api_key_env);
            healthy = false;
        }
    }

    match ProviderConfig::new("", &config.provider.base_url, std::time::Duration::ZERO) {
        Ok(_) => println!("  ✅ provider endpoint: {}", config.provider.base_url),
        Err(e) => {
            println!("  ❌ {e}");
            healthy = false;
        }
    }
    println!("  ℹ️  model: {}", config.provider.default_model);

    if let Err(e) = DeckFormat::parse_list(&config.defaults.formats.join(",")) {
        println!("  ❌ {e}");
        healthy = false;
    }

    println!();
    println!("Checking file structure:");
    let output_dir = PathBuf::from(&config.defaults.output_dir);
    if output_dir.is_dir() {
        println!("  ✅ output directory exists: {}", output_dir.display());
    } else {
        println!(
            "  ℹ️  output directory {} will be created on first run",
            output_dir.display()
        );
    }

    println!();
    if healthy {
        println!("All checks passed. You're good to go!");
        Ok(())
    } else {
        Err(eyre!(
            "some checks failed; run `slidesmith config init` and export {}",
            config.provider.api_key_env
        ))
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

//! Slidesmith CLI: turn a topic into a slide deck.
//!
//! Drafts an outline with a language model, optionally refines every slide
//! through research and condensing, and writes the deck to disk.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

//! Shared types, error model, and configuration for Slidesmith.
//!
//! This crate is the foundation depended on by all other Slidesmith crates.
//! It provides:
//! - The unified error type, [`SlidesmithError`]
//! - Domain types ([`Outline`], [`Slide`])
//! - Configuration ([`AppConfig`], [`ProviderConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, PipelineSettings, ProviderConfig, ProviderSettings, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{Result, SlidesmithError};
pub use types::{Outline, Slide};

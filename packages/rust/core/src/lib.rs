//! Outline pipeline and deck assembly for Slidesmith.
//!
//! This crate turns a topic into a validated [`Outline`](slidesmith_shared::Outline):
//! an initial draft, then optional per-slide research and condensing, and
//! finally writes the result to disk (`assembler`).

pub mod assembler;
pub mod condenser;
pub mod drafter;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod researcher;
mod stage;

#[cfg(test)]
mod test_support;

pub use pipeline::{OutlinePipeline, ProgressReporter, SilentProgress};
pub use prompts::{PipelineConfig, StageConfig};

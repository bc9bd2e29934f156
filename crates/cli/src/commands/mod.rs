//! Command handlers for the Agri-Climate Assistant CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod examples;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use examples::ExamplesCommand;

use agriclimate_core::{config::AppConfig, AppResult};
use agriclimate_pipeline::{Pipeline, PipelineOutcome, ProgressEvent, ProgressReporter};
use std::sync::Arc;

/// Validate credentials and build the pipeline, reporting progress on stderr
/// unless `quiet`.
pub(crate) fn build_pipeline(config: &AppConfig, quiet: bool) -> AppResult<Pipeline> {
    config.validate()?;

    let progress = if quiet {
        ProgressReporter::noop()
    } else {
        ProgressReporter::new(Arc::new(|event: ProgressEvent| eprintln!("  {}", event.message)))
    };

    Ok(Pipeline::from_config(config)?.with_progress(progress))
}

/// Print degraded-stage notices to stderr.
pub(crate) fn print_notices(outcome: &PipelineOutcome) {
    for notice in &outcome.notices {
        eprintln!("warning: {}", notice);
    }
}

//! Structured progress reporting for question runs.
//!
//! Provides incremental feedback while the pipeline waits on the language
//! model and the catalog.

use crate::types::PipelineStage;
use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during a pipeline run.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Stage the run was in when the event fired
    pub stage: PipelineStage,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        match self.elapsed_secs {
            Some(secs) => format!("[{}] {} ({:.1}s)", self.stage, self.message, secs),
            None => format!("[{}] {}", self.stage, self.message),
        }
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// Create a no-op reporter (no events emitted).
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.callback {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let event = event.with_elapsed(elapsed);

            tracing::debug!(
                stage = %event.stage,
                message = %event.message,
                elapsed_secs = elapsed,
                "Progress event"
            );

            callback(event);
        }
    }

    /// Announce entry into a stage.
    pub fn stage(&self, stage: PipelineStage) {
        let message = match stage {
            PipelineStage::Idle => "Waiting for a question",
            PipelineStage::Extracting => "Understanding your question...",
            PipelineStage::Planning => "Planning catalog searches...",
            PipelineStage::Retrieving => "Searching data.gov.in...",
            PipelineStage::Synthesizing => "Generating answer...",
            PipelineStage::Done => "Complete",
        };
        self.emit(ProgressEvent::new(stage, message));
    }

    pub fn identified(&self, summary: &str) {
        self.emit(ProgressEvent::new(
            PipelineStage::Extracting,
            format!("Identified: {}", summary),
        ));
    }

    pub fn searching(&self, query: &str) {
        self.emit(ProgressEvent::new(
            PipelineStage::Retrieving,
            format!("Searching: '{}'", query),
        ));
    }

    pub fn found(&self, datasets: usize) {
        self.emit(ProgressEvent::new(
            PipelineStage::Retrieving,
            format!("Found {} relevant datasets", datasets),
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

//! Shared pipeline types: stages, notices and degradable stage output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a question run in the pipeline state machine.
///
/// A run moves strictly forward through every variant exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Idle,
    Extracting,
    Planning,
    Retrieving,
    Synthesizing,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Planning => "planning",
            Self::Retrieving => "retrieving",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal, user-visible warning raised when a stage degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub stage: PipelineStage,
    pub message: String,
}

impl Notice {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Value produced by a stage, plus the notice if it had to fall back.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub value: T,
    pub notice: Option<Notice>,
}

impl<T> StageOutput<T> {
    /// The stage succeeded.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            notice: None,
        }
    }

    /// The stage failed and substituted `value`.
    pub fn degraded(value: T, notice: Notice) -> Self {
        tracing::warn!(stage = %notice.stage, "{}", notice.message);
        Self {
            value,
            notice: Some(notice),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.notice.is_some()
    }

    /// Move the notice (if any) into `notices` and return the value.
    pub fn collect_into(self, notices: &mut Vec<Notice>) -> T {
        notices.extend(self.notice);
        self.value
    }
}

//! Question pipeline for the Agri-Climate Assistant.
//!
//! Turns a free-text question about Indian agriculture or climate into a
//! cited answer in four sequential stages:
//!
//! 1. [`intent`]: extract a structured [`Intent`] with a language model
//! 2. [`planner`]: derive catalog search queries from the intent (pure rules)
//! 3. [`retriever`]: run the first queries against the open-data catalog
//! 4. [`synthesizer`]: write the answer from the retrieved dataset metadata
//!
//! Every external failure degrades to a default value plus a [`Notice`];
//! [`Pipeline::process`] always returns an answer.

pub mod catalog;
pub mod intent;
pub mod pipeline;
pub mod planner;
pub mod progress;
pub mod retriever;
pub mod session;
pub mod synthesizer;
pub mod transcript;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use catalog::{DataGovCatalog, DatasetCatalog, DatasetRecord};
pub use intent::{parse_intent, Intent, IntentExtractor};
pub use pipeline::{Pipeline, PipelineOptions, PipelineOutcome};
pub use planner::{plan, SearchQuery, FALLBACK_QUERY};
pub use progress::{ProgressEvent, ProgressReporter};
pub use retriever::DatasetRetriever;
pub use session::{example_question, ChatSession, EXAMPLE_QUESTIONS};
pub use synthesizer::{format_datasets, Answer, AnswerSynthesizer};
pub use transcript::{Role, Transcript, Turn};
pub use types::{Notice, PipelineStage, StageOutput};

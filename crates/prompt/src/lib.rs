//! Prompt system for the Agri-Climate Assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions, two of them built in
//! - Workspace overrides under `.agriclimate/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, load_prompt, ANSWER_SYNTHESIZE_PROMPT_ID, INTENT_EXTRACT_PROMPT_ID};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, GenerationSettings, OutputFormat, PromptDefinition,
    PromptOutputSpec,
};

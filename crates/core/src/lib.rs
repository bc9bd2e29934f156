//! Agri-Climate Assistant Core Library
//!
//! This crate provides the foundational utilities shared by every other crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (LLM provider, dataset catalog, pipeline limits)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, CatalogConfig, PipelineConfig};
pub use error::{AppError, AppResult};

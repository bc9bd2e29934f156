//! Logging infrastructure for the Agri-Climate Assistant.
//!
//! Initializes the tracing subscriber for structured logging. All logs go to
//! stderr so that stdout carries only answers (plain text or JSON).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Level used when neither a flag, `RUST_LOG` nor the config file sets one.
const DEFAULT_LEVEL: &str = "info";

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "debug", "agriclimate_pipeline=trace")
/// * `no_color` - Disable ANSI colours
///
/// # Example
/// ```no_run
/// use agriclimate_core::logging::init_logging;
///
/// init_logging(None, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let env_level = std::env::var("RUST_LOG").ok();
    let filter_str = resolve_filter(log_level, env_level.as_deref());

    let env_filter = EnvFilter::try_new(&filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter_str, e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && std::env::var("NO_COLOR").is_err());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Pick the effective filter string: explicit override, then `RUST_LOG`, then the default.
fn resolve_filter(log_level: Option<&str>, env_level: Option<&str>) -> String {
    let non_blank = |level: &&str| !level.trim().is_empty();
    log_level
        .filter(non_blank)
        .or(env_level.filter(non_blank))
        .unwrap_or(DEFAULT_LEVEL)
        .to_string()
}

//! Examples command handler.

use agriclimate_core::AppResult;
use agriclimate_pipeline::EXAMPLE_QUESTIONS;
use clap::Args;

/// List example questions
#[derive(Args, Debug)]
pub struct ExamplesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExamplesCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing examples command");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&EXAMPLE_QUESTIONS)?);
        } else {
            for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
                println!("{}. {}", i + 1, question);
            }
        }

        Ok(())
    }
}

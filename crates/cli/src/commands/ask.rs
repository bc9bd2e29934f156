//! Ask command handler.
//!
//! Runs one question through the pipeline and prints the cited answer.

use super::{build_pipeline, print_notices};
use agriclimate_core::{config::AppConfig, AppError, AppResult};
use agriclimate_pipeline::PipelineOutcome;
use clap::Args;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question, e.g. "Compare rice production in Punjab and Haryana"
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig, quiet: bool) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question_text()?;
        let pipeline = build_pipeline(config, quiet)?;

        let outcome = pipeline.process(&question).await;
        print_notices(&outcome);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&json_report(&outcome))?);
        } else {
            println!("{}", outcome.answer);
        }

        Ok(())
    }

    /// Words joined back into one question.
    fn question_text(&self) -> AppResult<String> {
        let question = self.question.join(" ");
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }
        Ok(question.to_string())
    }
}

fn json_report(outcome: &PipelineOutcome) -> serde_json::Value {
    serde_json::json!({
        "answer": outcome.answer,
        "intent": outcome.intent,
        "queries": outcome.queries,
        "executedQueries": outcome.executed_queries,
        "datasetsFound": outcome.datasets.len(),
        "citations": outcome.answer.citations(),
        "notices": outcome.notices,
    })
}

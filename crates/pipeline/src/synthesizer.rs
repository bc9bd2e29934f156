//! Answer synthesis.
//!
//! Formats the first few retrieved datasets into a numbered block and asks
//! the language model for an answer that cites them as `[Dataset N]`.

use crate::catalog::DatasetRecord;
use crate::intent::Intent;
use crate::types::{Notice, PipelineStage, StageOutput};
use agriclimate_core::{AppError, AppResult, PipelineConfig};
use agriclimate_llm::{LlmClient, LlmRequest};
use agriclimate_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Inserted in place of the dataset block when retrieval found nothing.
pub const NO_DATASETS: &str = "No datasets were found on data.gov.in for this question.";

const CITATION_PREFIX: &str = "[Dataset ";

/// Final answer text shown to the user and stored in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answer(String);

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Distinct `[Dataset N]` numbers, in order of first appearance.
    pub fn citations(&self) -> Vec<usize> {
        let mut found = Vec::new();
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find(CITATION_PREFIX) {
            rest = &rest[start + CITATION_PREFIX.len()..];
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 0 && rest[digits..].starts_with(']') {
                if let Ok(n) = rest[..digits].parse::<usize>() {
                    if !found.contains(&n) {
                        found.push(n);
                    }
                }
            }
        }

        found
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render at most `max` datasets as the numbered block embedded in the
/// synthesis prompt. Numbering starts at 1.
pub fn format_datasets(
    datasets: &[DatasetRecord],
    max: usize,
    description_chars: usize,
    url_base: &str,
) -> String {
    if datasets.is_empty() || max == 0 {
        return NO_DATASETS.to_string();
    }

    datasets
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, dataset)| {
            let description: String = dataset
                .description()
                .chars()
                .take(description_chars)
                .collect();
            format!(
                "Dataset {}:\nTitle: {}\nOrganization: {}\nDescription: {}...\nURL: {}",
                i + 1,
                dataset.title(),
                dataset.organization(),
                description,
                dataset.url(url_base)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Runs the synthesis prompt against a language model.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    settings: PipelineConfig,
    dataset_url_base: String,
}

impl AnswerSynthesizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        settings: PipelineConfig,
        dataset_url_base: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            prompt,
            model: model.into(),
            settings,
            dataset_url_base: dataset_url_base.into(),
        }
    }

    /// The dataset block this synthesizer would send for `datasets`.
    pub fn dataset_block(&self, datasets: &[DatasetRecord]) -> String {
        format_datasets(
            datasets,
            self.settings.max_prompt_datasets,
            self.settings.description_chars,
            &self.dataset_url_base,
        )
    }

    /// Synthesize an answer, propagating any model error.
    pub async fn try_synthesize(
        &self,
        question: &str,
        intent: &Intent,
        datasets: &[DatasetRecord],
    ) -> AppResult<Answer> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("intent".to_string(), intent.to_prompt_json());
        variables.insert("datasets".to_string(), self.dataset_block(datasets));
        let built = build_prompt(&self.prompt, variables)?;

        let wants_json = built.wants_json();
        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.settings.synthesis_temperature)
            .with_max_tokens(self.settings.synthesis_max_tokens);
        if wants_json {
            request = request.with_json_output();
        }
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.llm.complete(&request).await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(AppError::Llm("model returned an empty answer".to_string()));
        }

        Ok(Answer::new(text))
    }

    /// Synthesize an answer, substituting an error message on failure.
    pub async fn synthesize(
        &self,
        question: &str,
        intent: &Intent,
        datasets: &[DatasetRecord],
    ) -> StageOutput<Answer> {
        tracing::info!(
            "Synthesizing answer from {} datasets",
            datasets.len().min(self.settings.max_prompt_datasets)
        );

        match self.try_synthesize(question, intent, datasets).await {
            Ok(answer) => {
                tracing::debug!(citations = ?answer.citations(), "Answer synthesized");
                StageOutput::ok(answer)
            }
            Err(e) => {
                let message = format!("Error generating answer: {}", e);
                StageOutput::degraded(
                    Answer::new(message.clone()),
                    Notice::new(PipelineStage::Synthesizing, message),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::{record, RoutingLlm};
    use agriclimate_prompt::{builtin_prompt, ANSWER_SYNTHESIZE_PROMPT_ID};

    const URL_BASE: &str = "https://data.gov.in/dataset/";

    fn synthesizer(llm: Arc<RoutingLlm>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            llm,
            builtin_prompt(ANSWER_SYNTHESIZE_PROMPT_ID).unwrap(),
            "gpt-4",
            PipelineConfig::default(),
            URL_BASE,
        )
    }

    #[test]
    fn test_citations_in_first_appearance_order() {
        let answer = Answer::new(
            "Punjab leads [Dataset 2]. Haryana follows [Dataset 1] and [Dataset 2].\n\
             Ignored: [Dataset x], [Dataset 3, [dataset 4].\n## Sources\n- [Dataset 1]",
        );
        assert_eq!(answer.citations(), vec![2, 1]);
        assert!(Answer::new("no citations").citations().is_empty());
    }

    #[test]
    fn test_format_datasets_caps_entries() {
        let datasets: Vec<_> = (1..=8).map(|i| record(&format!("set-{i}"))).collect();
        let block = format_datasets(&datasets, 5, 200, URL_BASE);

        for i in 1..=5 {
            assert!(block.contains(&format!("Dataset {}:", i)));
        }
        assert!(!block.contains("Dataset 6:"));
        assert!(block.contains("URL: https://data.gov.in/dataset/set-1"));
    }

    #[test]
    fn test_format_datasets_truncates_description_on_char_boundary() {
        let dataset = DatasetRecord {
            description: Some("वर्षा".repeat(100)),
            ..DatasetRecord::default()
        };
        let block = format_datasets(&[dataset], 5, 200, URL_BASE);
        let line = block
            .lines()
            .find(|l| l.starts_with("Description: "))
            .unwrap();

        let kept = line.trim_start_matches("Description: ").trim_end_matches("...");
        assert_eq!(kept.chars().count(), 200);
        assert!(block.contains("Title: Unknown"));
        assert!(block.contains("Organization: Unknown"));
    }

    #[test]
    fn test_format_datasets_empty() {
        assert_eq!(format_datasets(&[], 5, 200, URL_BASE), NO_DATASETS);
    }

    #[tokio::test]
    async fn test_synthesize_request_shape() {
        let llm = Arc::new(RoutingLlm::new(
            Ok("{}".to_string()),
            Ok("Rice output is higher in Punjab [Dataset 1].".to_string()),
        ));
        let intent = Intent {
            data_needed: "rice production".to_string(),
            ..Intent::default()
        };

        let output = synthesizer(llm.clone())
            .synthesize("Compare rice production", &intent, &[record("rice-stats")])
            .await;

        assert!(!output.is_degraded());
        assert_eq!(output.value.citations(), vec![1]);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].json_output);
        assert_eq!(requests[0].temperature, Some(0.3));
        assert_eq!(requests[0].max_tokens, Some(1500));
        assert!(requests[0].prompt.contains("Compare rice production"));
        assert!(requests[0].prompt.contains("\"data_needed\": \"rice production\""));
        assert!(requests[0].prompt.contains("Title: rice-stats"));
        assert!(requests[0].prompt.contains("[Dataset N]"));
    }

    #[tokio::test]
    async fn test_synthesize_failure_returns_error_text() {
        let llm = Arc::new(RoutingLlm::new(
            Ok("{}".to_string()),
            Err("connection reset".to_string()),
        ));

        let output = synthesizer(llm).synthesize("Rainfall in Goa", &Intent::empty(), &[]).await;

        assert!(output.value.as_str().starts_with("Error generating answer: "));
        assert!(output.value.as_str().contains("connection reset"));
        assert_eq!(output.notice.unwrap().stage, PipelineStage::Synthesizing);
    }

    #[tokio::test]
    async fn test_blank_reply_is_a_failure() {
        let llm = Arc::new(RoutingLlm::new(Ok("{}".to_string()), Ok("  \n".to_string())));

        let output = synthesizer(llm).synthesize("Rainfall in Goa", &Intent::empty(), &[]).await;

        assert!(output.is_degraded());
        assert!(!output.value.as_str().is_empty());
    }
}

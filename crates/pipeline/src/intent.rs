//! Intent extraction.
//!
//! A language model reads the question and returns a JSON object with five
//! fields. Parsing is lenient about field shapes (a lone string where a list
//! was asked for, numeric years, nulls) but all-or-nothing about the object
//! itself: anything that is not a JSON object yields the empty intent.

use crate::types::{Notice, PipelineStage, StageOutput};
use agriclimate_core::{AppError, AppResult};
use agriclimate_llm::{LlmClient, LlmRequest};
use agriclimate_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Structured interpretation of a question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Category of data sought, e.g. "crop production" or "rainfall"
    #[serde(default, deserialize_with = "lenient_text")]
    pub data_needed: String,

    #[serde(default, deserialize_with = "lenient_list")]
    pub states: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub crops: Vec<String>,

    /// Year references as the model wrote them ("2019", "2015-16", ...)
    #[serde(default, deserialize_with = "lenient_list")]
    pub years: Vec<String>,

    /// Requested analysis, e.g. "compare", "trend", "max"
    #[serde(default, deserialize_with = "lenient_text")]
    pub operation: String,
}

impl Intent {
    /// The sentinel used when extraction fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// One-line description, e.g. "compare on rice production".
    pub fn summary(&self) -> String {
        let operation = non_blank(&self.operation).unwrap_or("analysis");
        let data = non_blank(&self.data_needed).unwrap_or("agricultural data");
        format!("{} on {}", operation, data)
    }

    /// Pretty JSON used inside the synthesis prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Parse a model reply into an [`Intent`].
///
/// Accepts a bare JSON object, or one embedded in surrounding prose or a
/// fenced code block.
pub fn parse_intent(raw: &str) -> AppResult<Intent> {
    let value = locate_json_object(raw).ok_or_else(|| {
        AppError::Serialization("model reply does not contain a JSON object".to_string())
    })?;

    Ok(serde_json::from_value(value)?)
}

fn locate_json_object(raw: &str) -> Option<Value> {
    let text = raw.trim().trim_matches('\u{feff}');

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")),
        Value::Object(_) => Err(serde::de::Error::custom(
            "expected a string, found an object",
        )),
        scalar => Ok(scalar_to_string(&scalar).unwrap_or_default()),
    }
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| {
                    serde::de::Error::custom("expected a list of strings or numbers")
                })
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect(),
        Value::Object(_) => Err(serde::de::Error::custom(
            "expected a list, found an object",
        )),
        scalar => Ok(scalar_to_string(&scalar)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect()),
    }
}

/// Runs the extraction prompt against a language model.
pub struct IntentExtractor {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
}

impl IntentExtractor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            llm,
            prompt,
            model: model.into(),
            temperature,
        }
    }

    /// Extract an intent, propagating any model or parse error.
    pub async fn try_extract(&self, question: &str) -> AppResult<Intent> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        let wants_json = built.wants_json();
        let mut request = LlmRequest::new(built.user, &self.model).with_temperature(self.temperature);
        if wants_json {
            request = request.with_json_output();
        }
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = built.metadata.generation.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await?;
        tracing::debug!("Raw intent reply: {}", response.content);

        parse_intent(&response.content)
    }

    /// Extract an intent, degrading to the empty intent on any failure.
    pub async fn extract(&self, question: &str) -> StageOutput<Intent> {
        tracing::info!("Extracting intent");

        match self.try_extract(question).await {
            Ok(intent) => {
                tracing::debug!(?intent, "Intent extracted");
                StageOutput::ok(intent)
            }
            Err(e) => StageOutput::degraded(
                Intent::empty(),
                Notice::new(
                    PipelineStage::Extracting,
                    format!("Error parsing question: {}", e),
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fakes::RoutingLlm;
    use agriclimate_prompt::{builtin_prompt, OutputFormat, INTENT_EXTRACT_PROMPT_ID};

    fn extractor(llm: Arc<RoutingLlm>) -> IntentExtractor {
        IntentExtractor::new(
            llm,
            builtin_prompt(INTENT_EXTRACT_PROMPT_ID).unwrap(),
            "gpt-4",
            0.1,
        )
    }

    #[test]
    fn test_parse_full_intent() {
        let intent = parse_intent(
            r#"{"data_needed": "crop production", "states": ["Punjab", "Haryana"],
                "crops": ["rice"], "years": ["2019", "2020"], "operation": "compare"}"#,
        )
        .unwrap();

        assert_eq!(intent.data_needed, "crop production");
        assert_eq!(intent.states, vec!["Punjab", "Haryana"]);
        assert_eq!(intent.crops, vec!["rice"]);
        assert_eq!(intent.years, vec!["2019", "2020"]);
        assert_eq!(intent.operation, "compare");
    }

    #[test]
    fn test_parse_missing_and_null_fields_default() {
        let intent = parse_intent(r#"{"data_needed": "rainfall", "states": null}"#).unwrap();
        assert_eq!(intent.data_needed, "rainfall");
        assert!(intent.states.is_empty());
        assert!(intent.crops.is_empty());
        assert!(intent.years.is_empty());
        assert_eq!(intent.operation, "");
    }

    #[test]
    fn test_parse_lenient_shapes() {
        let intent = parse_intent(
            r#"{"data_needed": "rainfall", "states": "Maharashtra", "years": [2018, 2019, null], "operation": ["trend"]}"#,
        )
        .unwrap();
        assert_eq!(intent.states, vec!["Maharashtra"]);
        assert_eq!(intent.years, vec!["2018", "2019"]);
        assert_eq!(intent.operation, "trend");
    }

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "Here you go:\n```json\n{\"data_needed\": \"yield\", \"crops\": [\"cotton\"]}\n```";
        let intent = parse_intent(raw).unwrap();
        assert_eq!(intent.crops, vec!["cotton"]);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_intent("I cannot help with that").is_err());
        assert!(parse_intent(r#"["rainfall"]"#).is_err());
        assert!(parse_intent(r#"{"states": {"name": "Goa"}}"#).is_err());
    }

    #[test]
    fn test_summary() {
        let intent = Intent {
            data_needed: "rice production".to_string(),
            operation: "compare".to_string(),
            ..Intent::default()
        };
        assert_eq!(intent.summary(), "compare on rice production");
        assert_eq!(Intent::empty().summary(), "analysis on agricultural data");
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(Intent::empty().is_empty());
        let intent = parse_intent(r#"{"crops": ["wheat"]}"#).unwrap();
        assert!(!intent.is_empty());
    }

    #[tokio::test]
    async fn test_extract_requests_json_at_low_temperature() {
        let llm = Arc::new(RoutingLlm::new(
            Ok(r#"{"data_needed": "rainfall", "states": ["Kerala"]}"#.to_string()),
            Ok("unused".to_string()),
        ));
        let output = extractor(llm.clone())
            .extract("Rainfall trends in Kerala")
            .await;

        assert!(!output.is_degraded());
        assert_eq!(output.value.states, vec!["Kerala"]);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_output);
        assert_eq!(requests[0].temperature, Some(0.1));
        assert!(requests[0].prompt.contains("Rainfall trends in Kerala"));
    }

    #[tokio::test]
    async fn test_extract_degrades_on_model_error() {
        let llm = Arc::new(RoutingLlm::new(
            Err("rate limited".to_string()),
            Ok("unused".to_string()),
        ));
        let output = extractor(llm).extract("Which state produces most wheat?").await;

        assert!(output.value.is_empty());
        let notice = output.notice.unwrap();
        assert_eq!(notice.stage, PipelineStage::Extracting);
        assert!(notice.message.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_extract_degrades_on_unparseable_reply() {
        let llm = Arc::new(RoutingLlm::new(
            Ok("not json at all".to_string()),
            Ok("unused".to_string()),
        ));
        let output = extractor(llm).extract("Cotton in Gujarat").await;

        assert!(output.value.is_empty());
        assert!(output.is_degraded());
    }

    #[tokio::test]
    async fn test_text_format_prompt_skips_json_mode() {
        let mut prompt = builtin_prompt(INTENT_EXTRACT_PROMPT_ID).unwrap();
        prompt.output.format = OutputFormat::Text;
        let llm = Arc::new(RoutingLlm::new(
            Ok("unused".to_string()),
            Ok(r#"{"data_needed": "rainfall"}"#.to_string()),
        ));
        let output = IntentExtractor::new(llm.clone(), prompt, "gpt-4", 0.1)
            .extract("Rainfall in Goa")
            .await;

        assert_eq!(output.value.data_needed, "rainfall");
        assert!(!llm.requests()[0].json_output);
    }
}

//! OpenAI chat-completions provider.
//!
//! Non-streaming client around `POST {endpoint}/v1/chat/completions`.
//! JSON mode is requested with `response_format: {"type": "json_object"}`.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use agriclimate_core::{AppError, AppResult};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default timeout when the config file does not set one.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest error body quoted back in an `AppError::Llm`.
const MAX_ERROR_SNIPPET: usize = 300;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI LLM client.
pub struct OpenAiClient {
    client: reqwest::Client,
    url_chat: String,
}

impl OpenAiClient {
    /// Create a client for `base_url` (e.g. `https://api.openai.com`).
    ///
    /// # Errors
    /// Returns `AppError::Config` if the endpoint is not http(s), the key is
    /// not a valid header value, or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> AppResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Invalid OpenAI endpoint: {}",
                base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| AppError::Config(format!("Invalid API key header: {}", e)))?;
        headers.insert(header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url_chat: format!("{}/v1/chat/completions", base),
        })
    }

    fn to_chat_request<'a>(&self, request: &'a LlmRequest) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatCompletionRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    fn convert_response(
        &self,
        response: ChatCompletionResponse,
        requested_model: &str,
    ) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Llm("OpenAI returned no choices".to_string()))?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse::new(
            content,
            response
                .model
                .unwrap_or_else(|| requested_model.to_string()),
            usage,
        ))
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let started = Instant::now();
        let body = self.to_chat_request(request);

        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            json_output = request.json_output,
            "POST {}", self.url_chat
        );

        let response = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_SNIPPET).collect();
            tracing::error!(%status, %snippet, "OpenAI chat completion returned non-success status");
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, snippet
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let result = self.convert_response(parsed, &request.model)?;

        tracing::info!(
            model = %result.model,
            total_tokens = result.usage.total_tokens,
            latency_ms = started.elapsed().as_millis() as u64,
            "Chat completion finished"
        );

        Ok(result)
    }
}

//! In-memory stand-ins for the language model and the catalog.

use crate::catalog::{DatasetCatalog, DatasetRecord};
use crate::planner::SearchQuery;
use agriclimate_core::{AppError, AppResult};
use agriclimate_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A record whose title and identifier are both `name`.
pub fn record(name: &str) -> DatasetRecord {
    DatasetRecord {
        title: Some(name.to_string()),
        organization: Some("Ministry of Agriculture and Farmers Welfare".to_string()),
        description: Some(format!("Statistics for {}", name)),
        identifier: Some(name.to_string()),
    }
}

/// Scripted model: JSON-mode requests get the intent reply, everything else
/// gets the answer reply. `Err` values become `AppError::Llm`.
pub struct RoutingLlm {
    intent_reply: Result<String, String>,
    answer_reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl RoutingLlm {
    pub fn new(intent_reply: Result<String, String>, answer_reply: Result<String, String>) -> Self {
        Self {
            intent_reply,
            answer_reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for RoutingLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = if request.json_output {
            &self.intent_reply
        } else {
            &self.answer_reply
        };

        match reply {
            Ok(content) => Ok(LlmResponse::new(
                content.clone(),
                request.model.clone(),
                LlmUsage::default(),
            )),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }
}

/// Catalog with canned results per query and an invocation counter.
#[derive(Default)]
pub struct FakeCatalog {
    results: HashMap<String, Vec<DatasetRecord>>,
    failing: HashSet<String>,
    fail_all: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every search fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn with_results(mut self, query: &str, records: Vec<DatasetRecord>) -> Self {
        self.results.insert(query.to_string(), records);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatasetCatalog for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, query: &SearchQuery, _rows: u32) -> AppResult<Vec<DatasetRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if self.fail_all || self.failing.contains(query.as_str()) {
            return Err(AppError::Catalog("HTTP 503 Service Unavailable".to_string()));
        }

        Ok(self.results.get(query.as_str()).cloned().unwrap_or_default())
    }
}

//! Pipeline orchestration.
//!
//! One call to [`Pipeline::process`] walks a question through
//! `Extracting → Planning → Retrieving → Synthesizing → Done`. Every stage
//! always runs; degraded stages hand their default value forward and leave a
//! [`Notice`] in the outcome.

use crate::catalog::{DataGovCatalog, DatasetCatalog, DatasetRecord};
use crate::intent::{Intent, IntentExtractor};
use crate::planner::{plan, SearchQuery};
use crate::progress::ProgressReporter;
use crate::retriever::DatasetRetriever;
use crate::synthesizer::{Answer, AnswerSynthesizer};
use crate::types::{Notice, PipelineStage};
use agriclimate_core::{AppConfig, AppError, AppResult, PipelineConfig};
use agriclimate_llm::{create_client, LlmClient};
use agriclimate_prompt::{
    builtin_prompt, load_prompt, PromptDefinition, ANSWER_SYNTHESIZE_PROMPT_ID,
    INTENT_EXTRACT_PROMPT_ID,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Everything a pipeline needs besides its two external ports.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub model: String,
    pub settings: PipelineConfig,
    pub dataset_url_base: String,
    pub extraction_prompt: PromptDefinition,
    pub synthesis_prompt: PromptDefinition,
}

impl PipelineOptions {
    /// Default settings and the built-in prompts.
    pub fn with_builtin_prompts(model: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            model: model.into(),
            settings: PipelineConfig::default(),
            dataset_url_base: agriclimate_core::CatalogConfig::default().dataset_url_base,
            extraction_prompt: builtin_prompt(INTENT_EXTRACT_PROMPT_ID)?,
            synthesis_prompt: builtin_prompt(ANSWER_SYNTHESIZE_PROMPT_ID)?,
        })
    }

    /// Settings from `config`, prompts from the workspace (or built in).
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            model: config.model.clone(),
            settings: config.pipeline.clone(),
            dataset_url_base: config.catalog.dataset_url_base.clone(),
            extraction_prompt: load_prompt(&config.workspace, INTENT_EXTRACT_PROMPT_ID)?,
            synthesis_prompt: load_prompt(&config.workspace, ANSWER_SYNTHESIZE_PROMPT_ID)?,
        })
    }
}

/// Result of one question run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub answer: Answer,
    pub intent: Intent,
    /// Full planner output, including queries past the execution cap
    pub queries: Vec<SearchQuery>,
    pub executed_queries: Vec<SearchQuery>,
    #[serde(skip)]
    pub datasets: Vec<DatasetRecord>,
    pub notices: Vec<Notice>,
    /// Stages visited, in order
    pub trace: Vec<PipelineStage>,
}

impl PipelineOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.notices.is_empty()
    }

    pub fn final_stage(&self) -> PipelineStage {
        self.trace.last().copied().unwrap_or(PipelineStage::Idle)
    }
}

/// The four-stage question pipeline.
pub struct Pipeline {
    extractor: IntentExtractor,
    retriever: DatasetRetriever,
    synthesizer: AnswerSynthesizer,
    progress: ProgressReporter,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        catalog: Arc<dyn DatasetCatalog>,
        options: PipelineOptions,
    ) -> Self {
        let PipelineOptions {
            model,
            settings,
            dataset_url_base,
            extraction_prompt,
            synthesis_prompt,
        } = options;

        Self {
            extractor: IntentExtractor::new(
                llm.clone(),
                extraction_prompt,
                model.clone(),
                settings.extraction_temperature,
            ),
            retriever: DatasetRetriever::new(
                catalog,
                settings.max_queries,
                settings.results_per_query,
            ),
            synthesizer: AnswerSynthesizer::new(
                llm,
                synthesis_prompt,
                model,
                settings,
                dataset_url_base,
            ),
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Build the production pipeline: configured LLM provider plus the
    /// data.gov.in catalog.
    ///
    /// # Errors
    /// Returns `AppError::Config` when a key is missing or a client cannot be
    /// built, and `AppError::Prompt` for an invalid prompt override.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let llm = create_client(
            &config.provider,
            config.provider_endpoint(),
            config.api_key.as_deref(),
            config.provider_timeout().map(Duration::from_secs),
        )?;

        let catalog_key = config.catalog_api_key.as_deref().ok_or_else(|| {
            AppError::Config(format!(
                "Catalog API key not set (export {})",
                config.catalog.api_key_env
            ))
        })?;
        let catalog = Arc::new(DataGovCatalog::new(&config.catalog, catalog_key)?);

        tracing::debug!(
            provider = llm.provider_name(),
            catalog = catalog.name(),
            model = %config.model,
            "Pipeline ready"
        );

        Ok(Self::new(llm, catalog, PipelineOptions::from_config(config)?))
    }

    /// Answer one question. Never fails; see [`PipelineOutcome::notices`].
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn process(&self, question: &str) -> PipelineOutcome {
        let mut trace = Vec::with_capacity(5);
        let mut notices = Vec::new();

        trace.push(PipelineStage::Extracting);
        self.progress.stage(PipelineStage::Extracting);
        let extracted = self.extractor.extract(question).await;
        if !extracted.is_degraded() && !extracted.value.is_empty() {
            self.progress.identified(&extracted.value.summary());
        }
        let intent = extracted.collect_into(&mut notices);

        trace.push(PipelineStage::Planning);
        self.progress.stage(PipelineStage::Planning);
        let queries = plan(&intent);

        trace.push(PipelineStage::Retrieving);
        self.progress.stage(PipelineStage::Retrieving);
        let executed_queries = self.retriever.executed(&queries).to_vec();
        let (datasets, retrieval_notices) =
            self.retriever.collect(&queries, &self.progress).await;
        notices.extend(retrieval_notices);

        trace.push(PipelineStage::Synthesizing);
        self.progress.stage(PipelineStage::Synthesizing);
        let answer = self
            .synthesizer
            .synthesize(question, &intent, &datasets)
            .await
            .collect_into(&mut notices);

        trace.push(PipelineStage::Done);
        self.progress.stage(PipelineStage::Done);

        tracing::info!(
            queries = queries.len(),
            executed = executed_queries.len(),
            datasets = datasets.len(),
            notices = notices.len(),
            "Question processed"
        );

        PipelineOutcome {
            answer,
            intent,
            queries,
            executed_queries,
            datasets,
            notices,
            trace,
        }
    }
}

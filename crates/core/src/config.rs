//! Configuration management for the Agri-Climate Assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults (reproduce the behaviour of the hosted chatbot)
//! - Config file (`.agriclimate/config.yaml` in the workspace, or `AGRI_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Credentials are only ever read from environment variables; the config file
//! names the variables, it never holds the secrets themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Environment variable holding the OpenAI key when no provider block overrides it.
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (may contain `.agriclimate/`)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("openai" or "ollama")
    pub provider: String,

    /// Model identifier used for both extraction and synthesis
    pub model: String,

    /// API key for the LLM provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API key for the open-data catalog
    #[serde(skip_serializing)]
    pub catalog_api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Dataset catalog settings
    pub catalog: CatalogConfig,

    /// Question pipeline limits and sampling settings
    pub pipeline: PipelineConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model named by this provider block.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Request timeout in seconds, if any.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Open-data catalog (data.gov.in) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    /// Package search endpoint
    pub endpoint: String,

    /// Prefix joined with a dataset's `name` to build its citation URL
    pub dataset_url_base: String,

    /// Environment variable holding the catalog API key
    pub api_key_env: String,

    /// Per-request timeout in seconds
    pub timeout: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.data.gov.in/api/3/action/package_search".to_string(),
            dataset_url_base: "https://data.gov.in/dataset/".to_string(),
            api_key_env: "DATA_GOV_API_KEY".to_string(),
            timeout: 10,
        }
    }
}

/// Limits and sampling settings for one question run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Planned queries actually executed against the catalog
    pub max_queries: usize,

    /// Rows requested per catalog query
    pub results_per_query: u32,

    /// Datasets shown to the synthesizer (and therefore citable)
    pub max_prompt_datasets: usize,

    /// Description characters kept per dataset in the synthesis prompt
    pub description_chars: usize,

    pub extraction_temperature: f32,

    pub synthesis_temperature: f32,

    pub synthesis_max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_queries: 2,
            results_per_query: 3,
            max_prompt_datasets: 5,
            description_chars: 200,
            extraction_temperature: 0.1,
            synthesis_temperature: 0.3,
            synthesis_max_tokens: 1500,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    catalog: Option<CatalogConfig>,
    pipeline: Option<PipelineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            catalog_api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            catalog: CatalogConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment variables.
    ///
    /// `workspace` and `config_file` come from CLI flags; when absent the
    /// current directory and `<workspace>/.agriclimate/config.yaml` are used.
    ///
    /// Environment variables:
    /// - `AGRI_WORKSPACE`: Workspace path when no flag is given
    /// - `AGRI_CONFIG`: Config file when no flag is given
    /// - `AGRI_PROVIDER`: LLM provider
    /// - `AGRI_MODEL`: Model identifier
    /// - `AGRI_API_KEY`: LLM API key (falls back to the provider's `apiKeyEnv`)
    /// - the catalog's `apiKeyEnv` (default `DATA_GOV_API_KEY`)
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use agriclimate_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Catalog: {}", config.catalog.endpoint);
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| non_empty_env("AGRI_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| non_empty_env("AGRI_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.app_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("AGRI_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("AGRI_MODEL") {
            config.model = model;
        }

        config.catalog_api_key = non_empty_env(&config.catalog.api_key_env);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if logging.level.is_some() && result.log_level.is_none() {
                result.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(catalog) = config_file.catalog {
            result.catalog = catalog;
        }

        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration and resolve the LLM key.
    ///
    /// Flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self.api_key = self.resolve_api_key(&self.provider);

        self
    }

    /// Path to the `.agriclimate` directory.
    pub fn app_dir(&self) -> PathBuf {
        self.workspace.join(".agriclimate")
    }

    /// Provider block for `provider`, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<&str> {
        self.get_provider_config(&self.provider)
            .and_then(ProviderConfig::endpoint)
    }

    /// Request timeout (seconds) for the active provider.
    pub fn provider_timeout(&self) -> Option<u64> {
        self.get_provider_config(&self.provider)
            .and_then(ProviderConfig::timeout)
    }

    /// Resolve the LLM API key from the environment.
    ///
    /// `AGRI_API_KEY` wins; otherwise the provider block's `apiKeyEnv`, and for
    /// OpenAI without a block, `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(key) = non_empty_env("AGRI_API_KEY") {
            return Some(key);
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => non_empty_env(api_key_env),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "openai" => non_empty_env(DEFAULT_OPENAI_KEY_ENV),
            None => None,
        }
    }

    /// Validate that the active provider is known and all credentials are present.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.api_key.is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.as_str(),
                _ => DEFAULT_OPENAI_KEY_ENV,
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {} (or AGRI_API_KEY)",
                env_var
            )));
        }

        if self.catalog_api_key.is_none() {
            return Err(AppError::Config(format!(
                "Catalog API key not found in environment variable: {}",
                self.catalog.api_key_env
            )));
        }

        if self.pipeline.max_queries == 0 || self.pipeline.results_per_query == 0 {
            return Err(AppError::Config(
                "pipeline.maxQueries and pipeline.resultsPerQuery must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn configured() -> AppConfig {
        AppConfig {
            api_key: Some("sk-test".to_string()),
            catalog_api_key: Some("catalog-test".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.catalog.timeout, 10);
        assert_eq!(config.pipeline.max_queries, 2);
        assert_eq!(config.pipeline.results_per_query, 3);
        assert_eq!(config.pipeline.max_prompt_datasets, 5);
        assert!(!config.verbose);
    }

    #[test]
    fn test_app_dir() {
        let config = AppConfig::default();
        assert!(config.app_dir().ends_with(".agriclimate"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = configured();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_openai_key() {
        let mut config = configured();
        config.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_validate_requires_catalog_key() {
        let mut config = configured();
        config.catalog_api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DATA_GOV_API_KEY"));
    }

    #[test]
    fn test_validate_ollama_without_llm_key() {
        let mut config = configured();
        config.provider = "ollama".to_string();
        config.api_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: "http://localhost:11434"
      model: llama3.2
      timeout: 90
catalog:
  timeout: 5
pipeline:
  maxQueries: 3
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.provider_endpoint(), Some("http://localhost:11434"));
        assert_eq!(merged.provider_timeout(), Some(90));
        assert_eq!(merged.catalog.timeout, 5);
        // Unset keys keep their defaults
        assert_eq!(
            merged.catalog.endpoint,
            CatalogConfig::default().endpoint
        );
        assert_eq!(merged.pipeline.max_queries, 3);
        assert_eq!(merged.pipeline.results_per_query, 3);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_openai_provider_block() {
        let yaml = r#"
activeProvider: openai
providers:
  openai:
    apiKeyEnv: MY_OPENAI_KEY
    model: gpt-4o
"#;
        let llm: LlmConfig = serde_yaml::from_str(yaml).unwrap();
        match llm.providers.get("openai") {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => {
                assert_eq!(api_key_env, "MY_OPENAI_KEY")
            }
            other => panic!("Expected OpenAI provider block, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load(
            Some(temp_dir.path().to_path_buf()),
            Some(temp_dir.path().join("missing.yaml")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_workspace_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let app_dir = temp_dir.path().join(".agriclimate");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.yaml"), "catalog:\n  timeout: 3\n").unwrap();

        let config = AppConfig::load(Some(temp_dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.catalog.timeout, 3);
        assert_eq!(config.workspace, temp_dir.path());
    }
}

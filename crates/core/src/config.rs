//! Configuration management for Yojana.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.yojana/config.yaml` or `YOJANA_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: data artifacts and prompt
//! overrides live under `.yojana/` unless configured otherwise.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Known LLM providers.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "gemini"];

/// Known embedding providers.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .yojana/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("ollama", "gemini")
    pub provider: String,

    /// Answer model identifier
    pub model: String,

    /// Explicit API key for the LLM provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub json_logs: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Query embedding settings
    pub embedding: EmbeddingSettings,

    /// Catalog and index artifact locations
    pub data: DataSettings,

    /// Retrieval and synthesis tuning
    pub retrieval: RetrievalSettings,
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
    Gemini {
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
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::Gemini { model, .. } | ProviderConfig::Ollama { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::Gemini { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            ProviderConfig::Gemini { timeout, .. } | ProviderConfig::Ollama { timeout, .. } => {
                *timeout
            }
        }
    }
}

/// Query embedding configuration.
///
/// Must describe the same model the vector index was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "ollama" or "mock"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Expected vector dimension
    pub dimensions: usize,

    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: None,
            timeout: None,
        }
    }
}

/// Locations of the pre-built artifacts, relative to the workspace unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSettings {
    pub catalog_path: PathBuf,

    /// LanceDB database directory
    pub index_path: PathBuf,

    #[serde(default = "default_index_table")]
    pub index_table: String,
}

fn default_index_table() -> String {
    "schemes".to_string()
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(".yojana/data/scheme_metadata.json"),
            index_path: PathBuf::from(".yojana/data/schemes.lance"),
            index_table: default_index_table(),
        }
    }
}

/// Retrieval and synthesis tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of schemes cited when the request does not say
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Candidates searched per requested scheme, absorbing filter losses
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Append a trailing "### Answer:" assistant segment to prompts
    #[serde(default = "default_answer_primer")]
    pub answer_primer: bool,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_k() -> usize {
    5
}

fn default_overfetch_factor() -> usize {
    2
}

fn default_answer_primer() -> bool {
    true
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            overfetch_factor: default_overfetch_factor(),
            answer_primer: default_answer_primer(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    embedding: Option<EmbeddingSettings>,
    data: Option<DataSettings>,
    retrieval: Option<RetrievalSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
            llm: None,
            embedding: EmbeddingSettings::default(),
            data: DataSettings::default(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `YOJANA_WORKSPACE`: Override workspace path
    /// - `YOJANA_CONFIG`: Path to config file
    /// - `YOJANA_PROVIDER`: LLM provider
    /// - `YOJANA_MODEL`: Model identifier
    /// - `YOJANA_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(&ConfigOverrides::default())
    }

    /// Load configuration, honoring workspace and config file overrides
    /// before the config file is read.
    pub fn load_with(overrides: &ConfigOverrides) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("YOJANA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(ref workspace) = overrides.workspace {
            config.workspace = workspace.clone();
        }

        if let Ok(config_file) = std::env::var("YOJANA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(ref config_file) = overrides.config_file {
            config.config_file = Some(config_file.clone());
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.yojana_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("YOJANA_PROVIDER") {
            config.set_provider(provider);
        }

        if let Ok(model) = std::env::var("YOJANA_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("YOJANA_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config.with_overrides(overrides.clone()))
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.json_logs = json;
            }
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(data) = config_file.data {
            result.data = data;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(llm) = config_file.llm {
            let active = llm.active_provider.clone();
            result.llm = Some(llm);
            result.set_provider(active);
        }

        Ok(result)
    }

    /// Switch the active provider, picking up its configured model.
    fn set_provider(&mut self, provider: String) {
        let configured_model = self
            .llm
            .as_ref()
            .and_then(|llm| llm.providers.get(&provider))
            .map(|pc| pc.model().to_string());

        self.model = match configured_model {
            Some(model) => model,
            None => default_model_for(&provider).to_string(),
        };
        self.provider = provider;
    }

    /// Apply CLI overrides, giving precedence to flags over everything else.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = overrides.provider {
            self.set_provider(provider);
        }

        if let Some(model) = overrides.model {
            self.model = model;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .yojana directory.
    pub fn yojana_dir(&self) -> PathBuf {
        self.workspace.join(".yojana")
    }

    /// Resolved path of the scheme catalog artifact.
    pub fn catalog_path(&self) -> PathBuf {
        self.resolve(&self.data.catalog_path)
    }

    /// Resolved path of the vector index artifact.
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.data.index_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get a provider's configuration, if the config file declares one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key for a provider.
    ///
    /// `YOJANA_API_KEY` wins; otherwise the provider's `apiKeyEnv` is read,
    /// falling back to `GEMINI_API_KEY` for an unconfigured Gemini provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => Some(api_key_env.as_str()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "gemini" => Some("GEMINI_API_KEY"),
            None => None,
        }?;

        std::env::var(env_var).ok().filter(|key| !key.is_empty())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.provider == "gemini" && self.resolve_api_key("gemini").is_none() {
            let env_var = match self.get_provider_config("gemini") {
                Some(ProviderConfig::Gemini { api_key_env, .. }) => api_key_env.clone(),
                _ => "GEMINI_API_KEY".to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }

        if self.retrieval.overfetch_factor == 0 {
            return Err(AppError::Config(
                "retrieval.overfetchFactor must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default answer model for a provider.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "gemini" => "gemini-2.0-flash",
        _ => "llama3.2",
    }
}

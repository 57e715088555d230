//! Configuration schema (tabletalk.toml)

use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Schema documentation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocConfig {
    /// Path to the schema documentation file
    #[serde(default = "default_doc_path")]
    pub path: PathBuf,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            path: default_doc_path(),
        }
    }
}

fn default_doc_path() -> PathBuf {
    PathBuf::from("schema_documentation.md")
}

/// Language model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama server base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling seed for reproducible output
    #[serde(default = "default_seed")]
    pub seed: u32,

    /// Maximum tokens to generate per call
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            seed: default_seed(),
            num_predict: default_num_predict(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3:8b".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_seed() -> u32 {
    42
}

fn default_num_predict() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    120
}

/// Few-shot example corpus settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplesConfig {
    /// Path to the example corpus file
    #[serde(default = "default_examples_path")]
    pub path: PathBuf,

    /// How many examples to sample into each prompt
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            path: default_examples_path(),
            sample_size: default_sample_size(),
        }
    }
}

fn default_examples_path() -> PathBuf {
    PathBuf::from("examples.txt")
}

fn default_sample_size() -> usize {
    3
}

/// Generation pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How many times a rejected query may be regenerated
    #[serde(default = "default_max_syntax_retries")]
    pub max_syntax_retries: u32,

    /// Whether `ask` executes the vetted query
    #[serde(default = "default_execute")]
    pub execute: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_syntax_retries: default_max_syntax_retries(),
            execute: default_execute(),
        }
    }
}

fn default_max_syntax_retries() -> u32 {
    2
}

fn default_execute() -> bool {
    true
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string; when absent, DATABASE_URL from the environment
    #[serde(default)]
    pub url: Option<String>,

    /// Schema to introspect
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Live schema cache lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            schema: default_schema(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    600
}

impl DatabaseConfig {
    /// Resolve the connection string: config first, then DATABASE_URL
    pub fn resolve_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
    }
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }

    /// Re-severity a batch of diagnostics in place
    pub fn apply(&self, diagnostics: &mut [Diagnostic]) {
        for diag in diagnostics.iter_mut() {
            diag.severity = self.get_severity(diag.code, diag.severity);
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Schema documentation
    #[serde(default)]
    pub doc: DocConfig,

    /// Language model
    #[serde(default)]
    pub llm: LlmConfig,

    /// Few-shot examples
    #[serde(default)]
    pub examples: ExamplesConfig,

    /// Generation pipeline
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Database connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve_path(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() || self.project_root.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("No database connection string: set [database].url or the DATABASE_URL environment variable")]
    MissingDatabaseUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.doc.path, PathBuf::from("schema_documentation.md"));
        assert_eq!(config.llm.model, "llama3:8b");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.seed, 42);
        assert_eq!(config.examples.sample_size, 3);
        assert_eq!(config.pipeline.max_syntax_retries, 2);
        assert!(config.pipeline.execute);
        assert_eq!(config.database.schema, "public");
        assert_eq!(config.database.cache_ttl_secs, 600);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [llm]
            model = "llama3:70b"

            [pipeline]
            max_syntax_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "llama3:70b");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.pipeline.max_syntax_retries, 5);
        assert!(config.pipeline.execute);
    }

    #[test]
    fn severity_override() {
        let mut threshold = SeverityThreshold::default();
        threshold.set_override(DiagnosticCode::DocMissingDescription, Severity::Error);

        assert_eq!(
            threshold.get_severity(DiagnosticCode::DocMissingDescription, Severity::Warn),
            Severity::Error
        );
        assert_eq!(
            threshold.get_severity(DiagnosticCode::DocEmptyTable, Severity::Warn),
            Severity::Warn
        );
    }

    #[test]
    fn severity_override_from_toml() {
        let config = Config::from_toml(
            r#"
            [severity.overrides]
            DOC_MISSING_DESCRIPTION = "error"
            "#,
        )
        .unwrap();

        let mut diags = vec![Diagnostic::new(
            DiagnosticCode::DocMissingDescription,
            Severity::Warn,
            "Missing description",
        )];
        config.severity.apply(&mut diags);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.llm, parsed.llm);
        assert_eq!(config.database, parsed.database);
    }

    #[test]
    fn configured_database_url_wins() {
        let mut config = Config::default();
        config.database.url = Some("postgres://localhost/sales".to_string());
        assert_eq!(
            config.database.resolve_url().unwrap(),
            "postgres://localhost/sales"
        );
    }

    #[test]
    fn resolve_path_against_project_root() {
        let mut config = Config::default();
        config.project_root = PathBuf::from("/srv/tabletalk");
        assert_eq!(
            config.resolve_path(std::path::Path::new("examples.txt")),
            PathBuf::from("/srv/tabletalk/examples.txt")
        );
        assert_eq!(
            config.resolve_path(std::path::Path::new("/etc/doc.md")),
            PathBuf::from("/etc/doc.md")
        );
    }
}

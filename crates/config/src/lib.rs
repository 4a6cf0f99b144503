//! Configuration loading, validation, and management for chatrelay.
//!
//! Loads configuration from `~/.chatrelay/config.toml` with environment
//! variable overrides for provider keys. Validates all settings at startup.

use chatrelay_core::{ApiProvider, ProviderCredentials};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.chatrelay/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Upstream call timeout and retry policy
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Provider-specific configurations, keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Knowledge retrieval configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const REDACTED: &str = "[REDACTED]";

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => REDACTED,
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("gateway", &self.gateway)
            .field("upstream", &self.upstream)
            .field("providers", &self.providers)
            .field("knowledge", &self.knowledge)
            .field("logging", &self.logging)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Browser origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Per-attempt upstream call timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per request (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    120
}
fn default_max_attempts() -> u32 {
    1
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    8_000
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the upstream base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Override the upstream model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// "placeholder", "documents" or "none"
    #[serde(default = "default_knowledge_source")]
    pub source: String,

    /// Text returned by the placeholder source
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,

    /// Saved documents kept per project; saving past this fails
    #[serde(default = "default_max_documents_per_project")]
    pub max_documents_per_project: usize,
}

pub const KNOWLEDGE_SOURCES: [&str; 3] = ["placeholder", "documents", "none"];

fn default_knowledge_source() -> String {
    "placeholder".into()
}
fn default_placeholder_text() -> String {
    "This is sample knowledge context that would be retrieved from the knowledge base.".into()
}
fn default_max_documents_per_project() -> usize {
    100
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source: default_knowledge_source(),
            placeholder_text: default_placeholder_text(),
            max_documents_per_project: default_max_documents_per_project(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// The default config file, `~/.chatrelay/config.toml`.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from `path`, then apply environment key overrides.
    ///
    /// For each provider, checks (highest priority first):
    /// - `CHATRELAY_<PROVIDER>_API_KEY`
    /// - `<PROVIDER>_API_KEY` (e.g. `OPENAI_API_KEY`)
    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields the defaults. Nothing is logged here since
    /// callers usually load config before tracing is set up.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Fill in provider keys from the environment.
    ///
    /// Environment keys win over keys from the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider in ApiProvider::ALL {
            let upper = provider.as_str().to_ascii_uppercase();
            let non_blank = |name: String| lookup(&name).filter(|k| !k.trim().is_empty());
            let key = non_blank(format!("CHATRELAY_{upper}_API_KEY"))
                .or_else(|| non_blank(format!("{upper}_API_KEY")));

            if let Some(key) = key {
                self.providers
                    .entry(provider.as_str().to_string())
                    .or_default()
                    .api_key = Some(key);
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatrelay")
    }

    /// Settings for one provider, if configured.
    pub fn provider(&self, provider: ApiProvider) -> Option<&ProviderConfig> {
        self.providers.get(provider.as_str())
    }

    /// The server-side key for a provider, if any.
    pub fn api_key(&self, provider: ApiProvider) -> Option<&str> {
        self.provider(provider).and_then(|p| p.api_key.as_deref())
    }

    /// Every configured server-side key, as request credentials.
    pub fn credentials(&self) -> ProviderCredentials {
        let mut credentials = ProviderCredentials::new();
        for provider in ApiProvider::ALL {
            if let Some(key) = self.api_key(provider) {
                credentials.set(provider, key);
            }
        }
        credentials
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "upstream.timeout_secs must be > 0".into(),
            ));
        }

        if self.upstream.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "upstream.max_attempts must be >= 1".into(),
            ));
        }

        if self.upstream.initial_backoff_ms > self.upstream.max_backoff_ms {
            return Err(ConfigError::ValidationError(
                "upstream.initial_backoff_ms must not exceed upstream.max_backoff_ms".into(),
            ));
        }

        // Sections are looked up by exact name, so "OpenAI" would be ignored.
        for name in self.providers.keys() {
            if !ApiProvider::ALL.iter().any(|p| p.as_str() == name) {
                return Err(ConfigError::ValidationError(format!(
                    "unknown provider section [providers.{name}], expected one of openai, anthropic, deepseek"
                )));
            }
        }

        if !KNOWLEDGE_SOURCES.contains(&self.knowledge.source.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "knowledge.source must be one of {KNOWLEDGE_SOURCES:?}, got {:?}",
                self.knowledge.source
            )));
        }

        if self.knowledge.max_documents_per_project == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.max_documents_per_project must be >= 1".into(),
            ));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of {LOG_FORMATS:?}, got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Render this config as TOML with every API key replaced.
    pub fn redacted_toml(&self) -> String {
        let mut redacted = self.clone();
        for provider in redacted.providers.values_mut() {
            if provider.api_key.is_some() {
                provider.api_key = Some(REDACTED.into());
            }
        }
        toml::to_string_pretty(&redacted).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.upstream.timeout_secs, 120);
        assert_eq!(config.upstream.max_attempts, 1);
        assert_eq!(config.knowledge.source, "placeholder");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.knowledge.placeholder_text, config.knowledge.placeholder_text);
    }

    #[test]
    fn invalid_upstream_settings_rejected() {
        let mut config = AppConfig::default();
        config.upstream.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.upstream.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.upstream.initial_backoff_ms = 10_000;
        config.upstream.max_backoff_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_provider_section_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
[providers.gemini]
api_key = "g-key"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn provider_section_names_are_exact() {
        for section in ["OpenAI", "\"deepseek \""] {
            let config: AppConfig =
                toml::from_str(&format!("[providers.{section}]\napi_key = \"sk-file\"\n")).unwrap();
            assert!(config.validate().is_err(), "[providers.{section}] accepted");
        }

        let config: AppConfig = toml::from_str("[providers.openai]\napi_key = \"sk-file\"\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_key(ApiProvider::OpenAi), Some("sk-file"));
    }

    #[test]
    fn mixed_case_provider_file_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[providers.OpenAI]\napi_key = \"sk-file\"\n").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(ref m) if m.contains("OpenAI")));
    }

    #[test]
    fn unknown_log_format_rejected() {
        let mut config = AppConfig::default();
        config.logging.format = "jsno".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jsno"));

        config.logging.format = "json".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_document_cap_rejected() {
        let mut config = AppConfig::default();
        assert_eq!(config.knowledge.max_documents_per_project, 100);
        config.knowledge.max_documents_per_project = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn credentials_cover_configured_keys() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "anthropic".into(),
            ProviderConfig {
                api_key: Some("sk-ant".into()),
                ..ProviderConfig::default()
            },
        );
        config.providers.insert("deepseek".into(), ProviderConfig::default());

        let credentials = config.credentials();
        assert_eq!(credentials.providers(), vec![ApiProvider::Anthropic]);
        assert_eq!(credentials.resolve(ApiProvider::Anthropic).unwrap().expose(), "sk-ant");
    }

    #[test]
    fn unknown_knowledge_source_rejected() {
        let mut config = AppConfig::default();
        config.knowledge.source = "vector".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 3000);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[gateway]
port = 8088

[upstream]
timeout_secs = 30
max_attempts = 3

[providers.anthropic]
api_key = "sk-ant-file"
api_url = "http://localhost:9999"

[knowledge]
source = "documents"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.gateway.port, 8088);
        assert_eq!(config.upstream.timeout(), Duration::from_secs(30));
        assert_eq!(config.upstream.max_attempts, 3);
        assert_eq!(config.api_key(ApiProvider::Anthropic), Some("sk-ant-file"));
        assert_eq!(
            config
                .provider(ApiProvider::Anthropic)
                .and_then(|p| p.api_url.as_deref()),
            Some("http://localhost:9999")
        );
        assert_eq!(config.knowledge.source, "documents");
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[gateway\nport = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_take_priority() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-file".into()),
                ..ProviderConfig::default()
            },
        );

        let env: HashMap<&str, &str> = HashMap::from([
            ("CHATRELAY_OPENAI_API_KEY", "sk-chatrelay"),
            ("OPENAI_API_KEY", "sk-generic"),
            ("DEEPSEEK_API_KEY", "sk-ds"),
            ("ANTHROPIC_API_KEY", "  "),
        ]);
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key(ApiProvider::OpenAi), Some("sk-chatrelay"));
        assert_eq!(config.api_key(ApiProvider::DeepSeek), Some("sk-ds"));
        assert_eq!(config.api_key(ApiProvider::Anthropic), None);
    }

    #[test]
    fn blank_chatrelay_key_falls_through_to_generic() {
        let mut config = AppConfig::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("CHATRELAY_OPENAI_API_KEY", ""),
            ("OPENAI_API_KEY", "sk-generic"),
            ("CHATRELAY_DEEPSEEK_API_KEY", "   "),
        ]);
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key(ApiProvider::OpenAi), Some("sk-generic"));
        assert_eq!(config.api_key(ApiProvider::DeepSeek), None);
    }

    #[test]
    fn secrets_are_redacted() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "deepseek".into(),
            ProviderConfig {
                api_key: Some("sk-very-secret".into()),
                ..ProviderConfig::default()
            },
        );
        assert!(!format!("{config:?}").contains("sk-very-secret"));

        let rendered = config.redacted_toml();
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("placeholder"));
        assert!(toml_str.contains("3000"));
    }
}

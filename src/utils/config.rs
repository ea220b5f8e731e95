use crate::utils::errors::{JsonTranslatorError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DELIMITER: &str = "\n🚀";
pub const DEFAULT_BATCH_SIZE: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub translation: TranslationDefaults,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationDefaults {
    pub source_lang: String,
    pub target_lang: String,
    pub batch_size: usize,
    pub delimiter: String,
    #[serde(default = "default_glossary")]
    pub glossary: Vec<GlossaryTerm>,
    /// Replaces the generated system instruction entirely when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GlossaryTerm {
    pub source: String,
    pub target: String,
}

impl GlossaryTerm {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    /// `Authorization: Bearer <key>`
    #[default]
    OpenAi,
    /// `api-key: <key>`
    Azure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub provider: ApiProvider,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "json-translator-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            translation: TranslationDefaults {
                source_lang: "Chinese".to_string(),
                target_lang: "English".to_string(),
                batch_size: DEFAULT_BATCH_SIZE,
                delimiter: DEFAULT_DELIMITER.to_string(),
                glossary: default_glossary(),
                system_prompt: None,
            },
            api: ApiConfig {
                provider: ApiProvider::OpenAi,
                endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                model: "llama-3.1-70b-versatile".to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
                timeout_seconds: 120,
                temperature: 0.0,
                max_retries: 3,
                retry_base_delay_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

/// Invoicing vocabulary the translator must not paraphrase.
pub fn default_glossary() -> Vec<GlossaryTerm> {
    vec![
        GlossaryTerm::new("票", "invoice (票 means 发票 unless stated otherwise)"),
        GlossaryTerm::new("红票 / 红字发票", "credit invoice"),
        GlossaryTerm::new("蓝票 / 蓝字发票", "invoice"),
        GlossaryTerm::new("开票项", "invoicing item"),
        GlossaryTerm::new("数电票", "fully digitized e-invoice"),
        GlossaryTerm::new("专票 / 增值税专用发票", "Special VAT Invoice"),
        GlossaryTerm::new("普票 / 增值税普通发票", "Normal VAT Invoice"),
    ]
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JsonTranslatorError::ConfigError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| JsonTranslatorError::ConfigError(e.to_string()))
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        match path {
            Some(p) => match Self::load_from_file(p) {
                Ok(config) => config,
                Err(e) => {
                    tracing::debug!(path = p, error = %e, "Using default configuration");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Builds the runtime session config, reading the API key from `api.api_key_env`.
    pub fn session_config(&self) -> TranslationSessionConfig {
        let api_key = std::env::var(&self.api.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!(
                variable = %self.api.api_key_env,
                "API key variable is not set, remote translation will fail"
            );
        }

        TranslationSessionConfig {
            source_lang: self.translation.source_lang.clone(),
            target_lang: self.translation.target_lang.clone(),
            batch_size: self.translation.batch_size,
            delimiter: self.translation.delimiter.clone(),
            glossary: self.translation.glossary.clone(),
            system_prompt: self.translation.system_prompt.clone(),
            provider: self.api.provider,
            api_endpoint: self.api.endpoint.clone(),
            api_key,
            model: self.api.model.clone(),
            temperature: self.api.temperature,
            timeout_seconds: self.api.timeout_seconds,
            max_retries: self.api.max_retries,
            retry_base_delay_ms: self.api.retry_base_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSessionConfig {
    pub source_lang: String,
    pub target_lang: String,
    pub batch_size: usize,
    pub delimiter: String,
    pub glossary: Vec<GlossaryTerm>,
    pub system_prompt: Option<String>,
    pub provider: ApiProvider,
    pub api_endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for TranslationSessionConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            source_lang: app.translation.source_lang,
            target_lang: app.translation.target_lang,
            batch_size: app.translation.batch_size,
            delimiter: app.translation.delimiter,
            glossary: app.translation.glossary,
            system_prompt: None,
            provider: app.api.provider,
            api_endpoint: app.api.endpoint,
            api_key: String::new(),
            model: app.api.model,
            temperature: app.api.temperature,
            timeout_seconds: app.api.timeout_seconds,
            max_retries: app.api.max_retries,
            retry_base_delay_ms: app.api.retry_base_delay_ms,
        }
    }
}

impl TranslationSessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(JsonTranslatorError::ValidationError(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.delimiter.is_empty() {
            return Err(JsonTranslatorError::ValidationError(
                "delimiter must not be empty".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(JsonTranslatorError::ValidationError(
                "max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TranslationSessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 30);
        assert_eq!(config.delimiter, "\n🚀");
        assert_eq!(config.glossary.len(), 7);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = TranslationSessionConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(JsonTranslatorError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
name = "translator"
version = "0.0.1"

[translation]
source_lang = "Chinese"
target_lang = "English"
batch_size = 10
delimiter = "|||"

[[translation.glossary]]
source = "发票"
target = "invoice"

[api]
provider = "azure"
endpoint = "https://example.openai.azure.com/openai/deployments/gpt/chat/completions?api-version=2024-06-01"
model = "gpt-4o-mini"
api_key_env = "AZURE_OPENAI_API_KEY"
timeout_seconds = 30
temperature = 0.0
max_retries = 2
retry_base_delay_ms = 10

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.translation.batch_size, 10);
        assert_eq!(config.api.provider, ApiProvider::Azure);
        assert_eq!(
            config.translation.glossary,
            vec![GlossaryTerm::new("发票", "invoice")]
        );
        assert!(config.translation.system_prompt.is_none());
    }

    #[test]
    fn test_missing_glossary_keeps_defaults() {
        let config: TranslationDefaults = toml::from_str(
            r#"
source_lang = "Chinese"
target_lang = "English"
batch_size = 30
delimiter = "|||"
"#,
        )
        .unwrap();
        assert_eq!(config.glossary, default_glossary());

        let config: TranslationDefaults = toml::from_str(
            r#"
source_lang = "Chinese"
target_lang = "English"
batch_size = 30
delimiter = "|||"
glossary = []
"#,
        )
        .unwrap();
        assert!(config.glossary.is_empty());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let config = AppConfig::load_or_default(Some("/definitely/not/here.toml"));
        assert_eq!(config.server.name, "json-translator-mcp");
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub translation: TranslationDefaults,
    pub spellcheck: SpellCheckDefaults,
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
    pub max_rows_per_batch: usize,
    pub max_context_chars: usize,
    pub max_preview_rows: usize,
    pub max_tokens_per_batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellCheckDefaults {
    pub default_max_rows: usize,
    pub max_rows_cap: usize,
    pub batch_size: usize,
    pub max_preview_rows: usize,
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub openai_endpoint: String,
    pub gemini_endpoint: String,
    pub openai_model: String,
    pub gemini_model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "locsheet-translator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for TranslationDefaults {
    fn default() -> Self {
        Self {
            max_rows_per_batch: 40,
            max_context_chars: 8000,
            max_preview_rows: 50,
            max_tokens_per_batch: 12000,
        }
    }
}

impl Default for SpellCheckDefaults {
    fn default() -> Self {
        Self {
            default_max_rows: 200,
            max_rows_cap: 500,
            batch_size: 40,
            max_preview_rows: 100,
            default_language: "Español".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            openai_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            gemini_endpoint: "https://generativelanguage.googleapis.com".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            translation: TranslationDefaults::default(),
            spellcheck: SpellCheckDefaults::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> crate::utils::errors::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::utils::errors::TranslatorError::ConfigError(e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| crate::utils::errors::TranslatorError::ConfigError(e.to_string()))
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        if let Some(p) = path {
            Self::load_from_file(p).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}

/// Provider credentials, resolved by the caller and passed into a run.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai: Option<String>,
    pub gemini: Option<String>,
}

impl Credentials {
    pub const OPENAI_ENV: &'static str = "OPENAI_API_KEY";
    pub const GEMINI_ENV: &'static str = "GEMINI_API_KEY";

    pub fn new(openai: Option<String>, gemini: Option<String>) -> Self {
        Self {
            openai: openai.filter(|k| !k.trim().is_empty()),
            gemini: gemini.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Only the composition root should call this.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(Self::OPENAI_ENV).ok(),
            std::env::var(Self::GEMINI_ENV).ok(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai", &self.openai.as_ref().map(|_| "<redacted>"))
            .field("gemini", &self.gemini.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub mod gemini;
pub mod openai;
pub mod parse;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use parse::parse_result_items;

use crate::utils::{ApiConfig, Credentials, Result, TranslatorError};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub id: String,
    pub translated_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetLanguage {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: String,
    pub key: String,
    pub source_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationBatchRequest {
    pub context_snippet: String,
    pub glossary_snippet: String,
    pub source_language_name: String,
    pub target_language: TargetLanguage,
    pub items: Vec<BatchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckBatchRequest {
    pub language_name: String,
    pub items: Vec<BatchItem>,
}

/// Capability contract every LLM backend implements.
///
/// A non-2xx response is an error; a malformed 2xx body yields an empty list.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn translate_batch(
        &self,
        credential: &str,
        model_id: &str,
        request: &TranslationBatchRequest,
    ) -> Result<Vec<ResultItem>>;

    fn supports_spell_check(&self) -> bool {
        false
    }

    async fn spell_correct_batch(
        &self,
        _credential: &str,
        _model_id: &str,
        _request: &SpellCheckBatchRequest,
    ) -> Result<Vec<ResultItem>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// Registration order. The first entry wins merge ties.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn credential_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => Credentials::OPENAI_ENV,
            ProviderKind::Gemini => Credentials::GEMINI_ENV,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
    Both,
}

impl ProviderMode {
    pub fn includes(&self, kind: ProviderKind) -> bool {
        match self {
            ProviderMode::Both => true,
            ProviderMode::OpenAi => kind == ProviderKind::OpenAi,
            ProviderMode::Gemini => kind == ProviderKind::Gemini,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    pub mode: ProviderMode,
    pub openai_model: String,
    pub gemini_model: String,
}

impl ProviderOptions {
    pub fn model_for(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Gemini => &self.gemini_model,
        }
    }
}

/// A provider selected for one run, with its credential and model.
#[derive(Clone)]
pub struct ActiveProvider {
    pub credential: String,
    pub model: String,
    adapter: Arc<dyn TranslationProvider>,
}

impl ActiveProvider {
    pub fn new(
        adapter: Arc<dyn TranslationProvider>,
        credential: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            credential: credential.into(),
            model: model.into(),
            adapter,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.adapter.kind()
    }

    pub fn adapter(&self) -> &dyn TranslationProvider {
        self.adapter.as_ref()
    }

    pub async fn translate_batch(&self, request: &TranslationBatchRequest) -> Result<Vec<ResultItem>> {
        self.adapter
            .translate_batch(&self.credential, &self.model, request)
            .await
    }

    pub async fn spell_correct_batch(&self, request: &SpellCheckBatchRequest) -> Result<Vec<ResultItem>> {
        self.adapter
            .spell_correct_batch(&self.credential, &self.model, request)
            .await
    }
}

impl fmt::Debug for ActiveProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveProvider")
            .field("kind", &self.kind())
            .field("model", &self.model)
            .field("credential", &"<redacted>")
            .finish()
    }
}

pub fn build_http_client(api: &ApiConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(api.timeout_seconds))
        .build()?)
}

pub fn build_adapter(
    kind: ProviderKind,
    client: reqwest::Client,
    api: &ApiConfig,
) -> Arc<dyn TranslationProvider> {
    match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(client, api.openai_endpoint.clone())),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(client, api.gemini_endpoint.clone())),
    }
}

/// Providers whose mode matches and whose credential is present, in registration order.
pub fn resolve_active_providers(
    options: &ProviderOptions,
    credentials: &Credentials,
    api: &ApiConfig,
) -> Result<Vec<ActiveProvider>> {
    let client = build_http_client(api)?;
    let mut active = Vec::new();

    for kind in ProviderKind::ALL {
        if !options.mode.includes(kind) {
            continue;
        }
        let credential = match kind {
            ProviderKind::OpenAi => credentials.openai.as_deref(),
            ProviderKind::Gemini => credentials.gemini.as_deref(),
        };
        let Some(credential) = credential else {
            tracing::warn!(provider = %kind, "Credential missing, provider skipped");
            continue;
        };
        active.push(ActiveProvider::new(
            build_adapter(kind, client.clone(), api),
            credential,
            options.model_for(kind),
        ));
    }

    if active.is_empty() {
        let missing: Vec<&str> = ProviderKind::ALL
            .iter()
            .filter(|k| options.mode.includes(**k))
            .map(|k| k.credential_env())
            .collect();
        return Err(TranslatorError::NoProviderConfigured(format!(
            "set {} in the environment",
            missing.join(" or ")
        )));
    }

    Ok(active)
}

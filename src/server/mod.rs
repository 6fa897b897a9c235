pub mod tools;

pub use tools::{AnalyzeSheetParams, LocSheetServer, SpellCheckSheetParams, TranslateSheetParams};

use crate::providers::{resolve_active_providers, ProviderMode, ProviderOptions};
use crate::sheet::{analyze_sheet, SheetMetadata};
use crate::translation::{
    spell_check_file, translate_file, ProgressReporter, SpellCheckRequest, SpellCheckResult,
    TranslateFileRequest, TranslateFileResult,
};
use crate::utils::{AppConfig, Credentials, Result, TranslatorError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const DEFAULT_SAMPLE_ROWS: usize = 10;

/// Composition root shared by the MCP tools and the HTTP routes.
#[derive(Debug, Clone)]
pub struct Workbench {
    config: Arc<AppConfig>,
    credentials: Arc<Credentials>,
}

impl Workbench {
    pub fn new(config: AppConfig, credentials: Credentials) -> Self {
        Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
        }
    }

    pub fn from_env(config: AppConfig) -> Self {
        Self::new(config, Credentials::from_env())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn analyze(&self, params: AnalyzeSheetParams) -> Result<SheetMetadata> {
        let sample_rows = params.sample_rows.unwrap_or(DEFAULT_SAMPLE_ROWS);
        analyze_sheet(&PathBuf::from(params.file_path), sample_rows).await
    }

    pub async fn translate(&self, params: TranslateSheetParams) -> Result<TranslateFileResult> {
        if params.target_languages.is_empty() {
            return Err(TranslatorError::ValidationError(
                "target_languages must not be empty".to_string(),
            ));
        }

        let request = TranslateFileRequest {
            file_path: PathBuf::from(params.file_path),
            source_language_name: params.source_language_name,
            target_languages: params.target_languages,
            contexts: params.contexts.into_iter().map(PathBuf::from).collect(),
            glossaries: params.glossaries.into_iter().map(PathBuf::from).collect(),
            provider_options: self.provider_options(
                params.provider_mode,
                params.openai_model,
                params.gemini_model,
            ),
            max_rows_per_batch: params.max_rows_per_batch,
            max_context_chars: params.max_context_chars,
        };

        let providers =
            resolve_active_providers(&request.provider_options, &self.credentials, &self.config.api)?;
        let (progress, forwarder) = log_progress("translate");
        let result = translate_file(&request, &providers, &self.config.translation, &progress).await;
        drop(progress);
        let _ = forwarder.await;
        result
    }

    pub async fn spell_check(&self, params: SpellCheckSheetParams) -> Result<SpellCheckResult> {
        let request = SpellCheckRequest {
            file_path: PathBuf::from(params.file_path),
            language: params.language,
            max_rows: params.max_rows,
            apply_to_file: params.apply_to_file.unwrap_or(true),
            provider_options: self.provider_options(
                params.provider_mode,
                params.openai_model,
                params.gemini_model,
            ),
        };

        let providers =
            resolve_active_providers(&request.provider_options, &self.credentials, &self.config.api)?;
        let (progress, forwarder) = log_progress("spellcheck");
        let result = spell_check_file(&request, &providers, &self.config.spellcheck, &progress).await;
        drop(progress);
        let _ = forwarder.await;
        result
    }

    fn provider_options(
        &self,
        mode: Option<ProviderMode>,
        openai_model: Option<String>,
        gemini_model: Option<String>,
    ) -> ProviderOptions {
        ProviderOptions {
            mode: mode.unwrap_or(ProviderMode::Both),
            openai_model: openai_model.unwrap_or_else(|| self.config.api.openai_model.clone()),
            gemini_model: gemini_model.unwrap_or_else(|| self.config.api.gemini_model.clone()),
        }
    }
}

/// Forwards progress events to the log until the reporter is dropped.
fn log_progress(operation: &'static str) -> (ProgressReporter, JoinHandle<()>) {
    let (reporter, mut rx) = ProgressReporter::channel();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(
                operation,
                percent = event.percent,
                stage = event.stage.as_deref().unwrap_or(""),
                current = event.current,
                total = event.total,
                "Progress"
            );
        }
    });
    (reporter, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TargetLanguage;

    fn workbench(credentials: Credentials) -> Workbench {
        Workbench::new(AppConfig::default(), credentials)
    }

    #[test]
    fn provider_options_fall_back_to_configured_models() {
        let wb = workbench(Credentials::default());
        let options = wb.provider_options(None, Some("gpt-4o".into()), None);
        assert_eq!(options.mode, ProviderMode::Both);
        assert_eq!(options.openai_model, "gpt-4o");
        assert_eq!(options.gemini_model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn translate_without_credentials_fails_before_touching_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.csv");
        std::fs::write(&path, "key,Español,English\ngreet,hola,\n").unwrap();

        let err = workbench(Credentials::default())
            .translate(TranslateSheetParams {
                file_path: path.display().to_string(),
                target_languages: vec![TargetLanguage {
                    code: "en".into(),
                    name: "English".into(),
                }],
                source_language_name: None,
                contexts: vec![],
                glossaries: vec![],
                provider_mode: Some(ProviderMode::OpenAi),
                openai_model: None,
                gemini_model: None,
                max_rows_per_batch: None,
                max_context_chars: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TranslatorError::NoProviderConfigured(ref m) if m.contains("OPENAI_API_KEY")));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "key,Español,English\ngreet,hola,\n"
        );
    }

    #[tokio::test]
    async fn empty_language_list_is_rejected() {
        let err = workbench(Credentials::new(Some("k".into()), None))
            .translate(TranslateSheetParams {
                file_path: "/tmp/none.csv".into(),
                target_languages: vec![],
                source_language_name: None,
                contexts: vec![],
                glossaries: vec![],
                provider_mode: None,
                openai_model: None,
                gemini_model: None,
                max_rows_per_batch: None,
                max_context_chars: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TranslatorError::ValidationError(_)));
    }
}

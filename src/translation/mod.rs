pub mod context;
pub mod merge;
pub mod progress;
pub mod spellcheck;

pub use context::{aggregate_context, aggregate_glossary, PromptContext};
pub use merge::{jaccard_similarity, merge_outputs, MergeOutcome, MergedCell};
pub use progress::{percent_of, ProgressEvent, ProgressReporter};
pub use spellcheck::{spell_check_file, spell_check_grid, SpellCheckRequest, SpellCheckResult};

use crate::providers::{
    ActiveProvider, BatchItem, ProviderKind, ProviderOptions, ResultItem, TargetLanguage,
    TranslationBatchRequest,
};
use crate::sheet::{
    estimate_batch_tokens, grid_to_csv_string, load_grid, save_grid, Batch, BatchPlanner, Grid,
    SheetFormat, WorkItem,
};
use crate::utils::{Credentials, Result, TranslationDefaults, TranslatorError};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

pub const DEFAULT_SOURCE_LANGUAGE: &str = "Source language";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateFileRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub source_language_name: Option<String>,
    pub target_languages: Vec<TargetLanguage>,
    #[serde(default)]
    pub contexts: Vec<PathBuf>,
    #[serde(default)]
    pub glossaries: Vec<PathBuf>,
    pub provider_options: ProviderOptions,
    #[serde(default)]
    pub max_rows_per_batch: Option<usize>,
    #[serde(default)]
    pub max_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub row_index: usize,
    pub key: String,
    pub source_text: String,
    pub per_language: BTreeMap<String, MergedCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationStats {
    pub total_rows: usize,
    pub translated_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateFileResult {
    pub file_path: String,
    pub csv_content: String,
    pub preview: Vec<PreviewRow>,
    pub stats: TranslationStats,
}

/// In-memory parameters of one translation pass over a grid.
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub source_language_name: Option<String>,
    pub target_languages: Vec<TargetLanguage>,
    pub max_rows_per_batch: usize,
    pub max_preview_rows: usize,
    pub max_tokens_per_batch: usize,
}

impl TranslationJob {
    pub fn new(target_languages: Vec<TargetLanguage>, defaults: &TranslationDefaults) -> Self {
        Self {
            source_language_name: None,
            target_languages,
            max_rows_per_batch: defaults.max_rows_per_batch,
            max_preview_rows: defaults.max_preview_rows,
            max_tokens_per_batch: defaults.max_tokens_per_batch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridTranslation {
    pub preview: Vec<PreviewRow>,
    pub translated_rows: usize,
    pub total_batches: usize,
}

struct LanguagePlan<'a> {
    language: &'a TargetLanguage,
    column: usize,
    batches: Vec<Batch>,
}

/// Loads the sheet, fills every missing target-language cell, and saves it once.
///
/// Nothing is written if any provider call fails.
pub async fn translate_file(
    request: &TranslateFileRequest,
    providers: &[ActiveProvider],
    defaults: &TranslationDefaults,
    progress: &ProgressReporter,
) -> Result<TranslateFileResult> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("translate", run_id = %run_id);
    run_translation(request, providers, defaults, progress)
        .instrument(span)
        .await
}

async fn run_translation(
    request: &TranslateFileRequest,
    providers: &[ActiveProvider],
    defaults: &TranslationDefaults,
    progress: &ProgressReporter,
) -> Result<TranslateFileResult> {
    SheetFormat::from_path(&request.file_path)?;

    info!(
        file = %request.file_path.display(),
        languages = ?request.target_languages.iter().map(|l| l.code.as_str()).collect::<Vec<_>>(),
        mode = ?request.provider_options.mode,
        "Translation started"
    );

    let mut grid = load_grid(&request.file_path).await?;
    let max_chars = request
        .max_context_chars
        .unwrap_or(defaults.max_context_chars);
    let prompt = PromptContext::load(&request.contexts, &request.glossaries, max_chars).await;

    let mut job = TranslationJob::new(request.target_languages.clone(), defaults);
    job.source_language_name = request.source_language_name.clone();
    if let Some(batch) = request.max_rows_per_batch {
        job.max_rows_per_batch = batch;
    }

    let outcome = translate_grid(&mut grid, &job, providers, &prompt, progress).await?;

    save_grid(&request.file_path, &grid).await?;
    let csv_content = grid_to_csv_string(&grid)?;

    let stats = TranslationStats {
        total_rows: grid.data_row_count(),
        translated_rows: outcome.translated_rows,
    };
    info!(
        translated_rows = stats.translated_rows,
        total_rows = stats.total_rows,
        batches = outcome.total_batches,
        "Translation completed"
    );

    Ok(TranslateFileResult {
        file_path: request.file_path.display().to_string(),
        csv_content,
        preview: outcome.preview,
        stats,
    })
}

/// Core loop: language by language, batch by batch, in order.
///
/// Pending work is planned once up front; providers for a batch are called
/// concurrently and their answers merged per item.
pub async fn translate_grid(
    grid: &mut Grid,
    job: &TranslationJob,
    providers: &[ActiveProvider],
    prompt: &PromptContext,
    progress: &ProgressReporter,
) -> Result<GridTranslation> {
    if providers.is_empty() {
        return Err(TranslatorError::NoProviderConfigured(format!(
            "set {} or {} in the environment",
            Credentials::OPENAI_ENV,
            Credentials::GEMINI_ENV
        )));
    }

    let source_language_name = job
        .source_language_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| grid.source_language_header())
        .unwrap_or(DEFAULT_SOURCE_LANGUAGE)
        .to_string();

    let mut seen = HashSet::new();
    let languages: Vec<&TargetLanguage> = job
        .target_languages
        .iter()
        .filter(|lang| seen.insert(lang.name.trim().to_lowercase()))
        .collect();

    let columns: Vec<usize> = languages
        .iter()
        .map(|lang| grid.ensure_language_column(&lang.name))
        .collect();

    let planner = BatchPlanner::new(job.max_rows_per_batch);
    let plans: Vec<LanguagePlan> = languages
        .into_iter()
        .zip(columns)
        .map(|(language, column)| LanguagePlan {
            language,
            column,
            batches: planner.into_batches(planner.pending_translations(grid, &language.code, column)),
        })
        .collect();
    let total_batches: usize = plans.iter().map(|p| p.batches.len()).sum();

    let mut preview = build_preview(grid, job.max_preview_rows);
    let preview_index: HashMap<usize, usize> = preview
        .iter()
        .enumerate()
        .map(|(i, row)| (row.row_index, i))
        .collect();

    let mut translated_rows = 0;
    let mut batches_done = 0;

    for plan in &plans {
        for batch in &plan.batches {
            let request = TranslationBatchRequest {
                context_snippet: prompt.context_snippet.clone(),
                glossary_snippet: prompt.glossary_snippet.clone(),
                source_language_name: source_language_name.clone(),
                target_language: plan.language.clone(),
                items: batch_items(&batch.items),
            };

            let texts: Vec<&str> = batch.items.iter().map(|i| i.source_text.as_str()).collect();
            let approx_tokens =
                estimate_batch_tokens(&texts, &prompt.context_snippet, &prompt.glossary_snippet);
            if approx_tokens > job.max_tokens_per_batch {
                warn!(
                    language = %plan.language.code,
                    batch = batch.index,
                    approx_tokens,
                    "Batch exceeds token budget"
                );
            }

            let answers = dispatch(providers, &request, &plan.language.code, batch).await?;

            for item in &batch.items {
                let cell = merge_item(providers, &answers, item);

                if !cell.merged_text.is_empty() {
                    grid.set_cell(item.row_index, plan.column, cell.merged_text.clone());
                    translated_rows += 1;
                }

                if let Some(&idx) = preview_index.get(&item.row_index) {
                    preview[idx]
                        .per_language
                        .insert(plan.language.code.clone(), cell);
                }
            }

            batches_done += 1;
            progress.report_stage(percent_of(batches_done, total_batches), plan.language.name.clone());
        }
    }

    progress.report_stage(100, "done");

    Ok(GridTranslation {
        preview,
        translated_rows,
        total_batches,
    })
}

async fn dispatch(
    providers: &[ActiveProvider],
    request: &TranslationBatchRequest,
    language_code: &str,
    batch: &Batch,
) -> Result<Vec<HashMap<String, String>>> {
    let calls = providers.iter().map(|provider| async move {
        info!(
            provider = %provider.kind(),
            language = %language_code,
            batch = batch.index,
            items = batch.len(),
            "Dispatching batch"
        );
        match provider.translate_batch(request).await {
            Ok(results) => {
                info!(provider = %provider.kind(), returned = results.len(), "Provider answered");
                Ok(results_by_id(results))
            }
            Err(e) => {
                error!(provider = %provider.kind(), error = %e, "Provider call failed");
                Err(e)
            }
        }
    });

    try_join_all(calls).await
}

fn results_by_id(results: Vec<ResultItem>) -> HashMap<String, String> {
    results
        .into_iter()
        .filter(|r| !r.translated_text.is_empty())
        .map(|r| (r.id, r.translated_text))
        .collect()
}

fn merge_item(
    providers: &[ActiveProvider],
    answers: &[HashMap<String, String>],
    item: &WorkItem,
) -> MergedCell {
    let answer = |slot: usize| answers.get(slot).and_then(|m| m.get(&item.id)).map(String::as_str);
    let outcome = merge_outputs(answer(0), answer(1), &item.source_text);

    let mut cell = MergedCell {
        openai_text: None,
        gemini_text: None,
        merged_text: outcome.merged_text,
        confidence: outcome.confidence,
    };
    for (slot, provider) in providers.iter().enumerate() {
        let text = answer(slot).map(str::to_string);
        match provider.kind() {
            ProviderKind::OpenAi => cell.openai_text = text,
            ProviderKind::Gemini => cell.gemini_text = text,
        }
    }
    cell
}

fn batch_items(items: &[WorkItem]) -> Vec<BatchItem> {
    items
        .iter()
        .map(|it| BatchItem {
            id: it.id.clone(),
            key: it.key.clone(),
            source_text: it.source_text.clone(),
        })
        .collect()
}

/// First `max_rows` non-blank data rows.
fn build_preview(grid: &Grid, max_rows: usize) -> Vec<PreviewRow> {
    (1..grid.len())
        .filter(|&row| !grid.is_blank_row(row))
        .take(max_rows)
        .map(|row| PreviewRow {
            row_index: row,
            key: grid.key(row).to_string(),
            source_text: grid.source_text(row).to_string(),
            per_language: BTreeMap::new(),
        })
        .collect()
}

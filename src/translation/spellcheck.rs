use crate::providers::{ActiveProvider, BatchItem, ProviderOptions, SpellCheckBatchRequest};
use crate::sheet::{grid_to_csv_string, load_grid, save_grid, BatchPlanner, Grid, SheetFormat, SOURCE_COLUMN};
use crate::translation::progress::ProgressReporter;
use crate::utils::{Result, SpellCheckDefaults, TranslatorError};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info, Instrument};
use uuid::Uuid;

fn default_apply() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default = "default_apply")]
    pub apply_to_file: bool,
    pub provider_options: ProviderOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckPreviewRow {
    pub row_index: usize,
    pub key: String,
    pub original_source: String,
    pub corrected_source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckStats {
    pub total_rows: usize,
    pub corrected_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckResult {
    pub file_path: String,
    pub csv_content: String,
    pub preview: Vec<SpellCheckPreviewRow>,
    pub stats: SpellCheckStats,
}

#[derive(Debug, Clone)]
pub struct GridSpellCheck {
    pub preview: Vec<SpellCheckPreviewRow>,
    pub corrected_rows: usize,
}

/// Corrects the source column in place. With `apply_to_file = false` the
/// corrected grid is only returned, never written.
pub async fn spell_check_file(
    request: &SpellCheckRequest,
    providers: &[ActiveProvider],
    defaults: &SpellCheckDefaults,
    progress: &ProgressReporter,
) -> Result<SpellCheckResult> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("spellcheck", run_id = %run_id);
    run_spell_check(request, providers, defaults, progress)
        .instrument(span)
        .await
}

async fn run_spell_check(
    request: &SpellCheckRequest,
    providers: &[ActiveProvider],
    defaults: &SpellCheckDefaults,
    progress: &ProgressReporter,
) -> Result<SpellCheckResult> {
    SheetFormat::from_path(&request.file_path)?;

    let language = request
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(&defaults.default_language)
        .to_string();
    let max_rows = request
        .max_rows
        .unwrap_or(defaults.default_max_rows)
        .min(defaults.max_rows_cap);

    info!(
        file = %request.file_path.display(),
        language = %language,
        max_rows,
        apply = request.apply_to_file,
        "Spell-check started"
    );

    let mut grid = load_grid(&request.file_path).await?;
    let outcome = spell_check_grid(
        &mut grid,
        &language,
        max_rows,
        defaults,
        providers,
        progress,
    )
    .await?;

    if request.apply_to_file {
        save_grid(&request.file_path, &grid).await?;
    }
    let csv_content = grid_to_csv_string(&grid)?;

    let stats = SpellCheckStats {
        total_rows: grid.data_row_count(),
        corrected_rows: outcome.corrected_rows,
    };
    info!(corrected_rows = stats.corrected_rows, "Spell-check completed");

    Ok(SpellCheckResult {
        file_path: request.file_path.display().to_string(),
        csv_content,
        preview: outcome.preview,
        stats,
    })
}

pub async fn spell_check_grid(
    grid: &mut Grid,
    language: &str,
    max_rows: usize,
    defaults: &SpellCheckDefaults,
    providers: &[ActiveProvider],
    progress: &ProgressReporter,
) -> Result<GridSpellCheck> {
    let checkers: Vec<&ActiveProvider> = providers
        .iter()
        .filter(|p| p.adapter().supports_spell_check())
        .collect();
    if checkers.is_empty() {
        return Err(TranslatorError::NoProviderConfigured(
            "no configured provider supports spell-check".to_string(),
        ));
    }

    let planner = BatchPlanner::new(defaults.batch_size);
    let items = planner.pending_spellcheck(grid, max_rows);
    let total = items.len();
    let batches = planner.into_batches(items);

    let mut preview = Vec::new();
    let mut corrected_rows = 0;
    let mut done = 0;

    for batch in &batches {
        let request = SpellCheckBatchRequest {
            language_name: language.to_string(),
            items: batch
                .items
                .iter()
                .map(|it| BatchItem {
                    id: it.id.clone(),
                    key: it.key.clone(),
                    source_text: it.source_text.clone(),
                })
                .collect(),
        };

        let calls = checkers.iter().map(|provider| {
            let request = &request;
            async move {
                match provider.spell_correct_batch(request).await {
                    Ok(results) => Ok(results
                        .into_iter()
                        .filter(|r| !r.translated_text.is_empty())
                        .map(|r| (r.id, r.translated_text))
                        .collect::<HashMap<_, _>>()),
                    Err(e) => {
                        error!(provider = %provider.kind(), error = %e, "Spell-check call failed");
                        Err(e)
                    }
                }
            }
        });
        let answers = try_join_all(calls).await?;

        for item in &batch.items {
            let corrected = answers
                .iter()
                .find_map(|m| m.get(&item.id))
                .cloned()
                .unwrap_or_else(|| item.source_text.clone());

            if corrected != item.source_text {
                grid.set_cell(item.row_index, SOURCE_COLUMN, corrected.clone());
                corrected_rows += 1;
            }

            if preview.len() < defaults.max_preview_rows {
                preview.push(SpellCheckPreviewRow {
                    row_index: item.row_index,
                    key: item.key.clone(),
                    original_source: item.source_text.clone(),
                    corrected_source: corrected,
                });
            }
        }

        done += batch.len();
        progress.report_items(done, total);
    }

    progress.report_stage(100, "done");

    Ok(GridSpellCheck {
        preview,
        corrected_rows,
    })
}

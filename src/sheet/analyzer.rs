use crate::sheet::grid::{Grid, FIRST_TARGET_COLUMN};
use crate::sheet::planner::BatchPlanner;
use crate::sheet::reader::load_grid;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetadata {
    pub total_rows: usize,
    pub total_columns: usize,
    pub column_names: Vec<String>,
    pub source_language: Option<String>,
    pub target_languages: Vec<String>,
    pub pending_by_language: BTreeMap<String, usize>,
    pub file_size_bytes: u64,
    pub estimated_tokens: usize,
    pub sample_data: Vec<JsonValue>,
}

pub async fn analyze_sheet(path: &Path, sample_rows: usize) -> Result<SheetMetadata> {
    let grid = load_grid(path).await?;
    let file_size_bytes = tokio::fs::metadata(path).await?.len();
    Ok(describe_grid(&grid, file_size_bytes, sample_rows))
}

pub fn describe_grid(grid: &Grid, file_size_bytes: u64, sample_rows: usize) -> SheetMetadata {
    let column_names: Vec<String> = grid.header().to_vec();
    let total_columns = grid.rows().iter().map(|r| r.len()).max().unwrap_or(0);
    let planner = BatchPlanner::default();

    let mut target_languages = Vec::new();
    let mut pending_by_language = BTreeMap::new();
    for (col, name) in column_names.iter().enumerate().skip(FIRST_TARGET_COLUMN) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let pending = planner.pending_translations(grid, name, col).len();
        target_languages.push(name.to_string());
        pending_by_language.insert(name.to_string(), pending);
    }

    let sample_data: Vec<JsonValue> = grid
        .rows()
        .iter()
        .skip(1)
        .take(sample_rows)
        .map(|record| {
            let mut map = serde_json::Map::new();
            for (i, field) in record.iter().enumerate() {
                if let Some(col_name) = column_names.get(i) {
                    map.insert(col_name.clone(), JsonValue::String(field.clone()));
                }
            }
            JsonValue::Object(map)
        })
        .collect();

    let source_text: String = (1..grid.len())
        .map(|row| grid.source_text(row))
        .collect::<Vec<_>>()
        .join("\n");

    SheetMetadata {
        total_rows: grid.data_row_count(),
        total_columns,
        source_language: grid.source_language_header().map(str::to_string),
        column_names,
        target_languages,
        pending_by_language,
        file_size_bytes,
        estimated_tokens: estimate_tokens(&source_text),
        sample_data,
    }
}

fn bpe() -> Option<&'static CoreBPE> {
    static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    BPE.get_or_init(|| cl100k_base().ok()).as_ref()
}

pub fn estimate_tokens(text: &str) -> usize {
    match bpe() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens_fallback(text),
    }
}

pub fn estimate_tokens_fallback(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Approximate prompt size of one batch including the shared context strings.
pub fn estimate_batch_tokens(texts: &[&str], context: &str, glossary: &str) -> usize {
    estimate_tokens(&texts.join("\n")) + estimate_tokens(context) + estimate_tokens(glossary)
}

use crate::sheet::grid::Grid;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 40;

/// One (row, target) obligation sent to providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub row_index: usize,
    /// Correlation token echoed back by providers.
    pub id: String,
    pub key: String,
    pub source_text: String,
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,
    pub items: Vec<WorkItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn translation_item_id(language_code: &str, row_index: usize) -> String {
    format!("{}:{}", language_code, row_index)
}

pub fn spellcheck_item_id(row_index: usize) -> String {
    format!("spell:{}", row_index)
}

/// Read-only planner that turns the grid into batches of pending work.
pub struct BatchPlanner {
    batch_size: usize,
}

impl BatchPlanner {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Rows whose source is non-empty and whose `language_column` cell is empty.
    pub fn pending_translations(
        &self,
        grid: &Grid,
        language_code: &str,
        language_column: usize,
    ) -> Vec<WorkItem> {
        (1..grid.len())
            .filter(|&row| !grid.is_blank_row(row))
            .filter(|&row| {
                !grid.source_text(row).is_empty() && grid.cell(row, language_column).trim().is_empty()
            })
            .map(|row| WorkItem {
                row_index: row,
                id: translation_item_id(language_code, row),
                key: grid.key(row).to_string(),
                source_text: grid.source_text(row).to_string(),
            })
            .collect()
    }

    /// Data rows `1..=max_rows` with non-empty source text.
    pub fn pending_spellcheck(&self, grid: &Grid, max_rows: usize) -> Vec<WorkItem> {
        let end = grid.len().min(max_rows.saturating_add(1));
        (1..end)
            .filter(|&row| !grid.source_text(row).is_empty())
            .map(|row| WorkItem {
                row_index: row,
                id: spellcheck_item_id(row),
                key: grid.key(row).to_string(),
                source_text: grid.source_text(row).to_string(),
            })
            .collect()
    }

    /// Consecutive batches in backlog order; only the last may be short.
    pub fn into_batches(&self, items: Vec<WorkItem>) -> Vec<Batch> {
        let mut batches = Vec::with_capacity(self.batch_count(items.len()));
        let mut iter = items.into_iter().peekable();
        let mut index = 0;

        while iter.peek().is_some() {
            let chunk: Vec<WorkItem> = iter.by_ref().take(self.batch_size).collect();
            batches.push(Batch { index, items: chunk });
            index += 1;
        }

        batches
    }

    pub fn batch_count(&self, pending: usize) -> usize {
        pending.div_ceil(self.batch_size)
    }
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn filled_cells_are_never_pending() {
        let g = grid(&[
            &["key", "src", "EN"],
            &["k1", "hola", "hello"],
            &["k2", "adios", ""],
            &["k3", "gracias"],
            &["k4", "", ""],
            &["", "", ""],
        ]);
        let planner = BatchPlanner::default();
        let items = planner.pending_translations(&g, "en", 2);

        let rows: Vec<usize> = items.iter().map(|i| i.row_index).collect();
        assert_eq!(rows, vec![2, 3]);
        assert_eq!(items[0].id, "en:2");
        assert_eq!(items[1].source_text, "gracias");
    }

    #[test]
    fn whitespace_only_target_counts_as_empty() {
        let g = grid(&[&["key", "src", "EN"], &["k1", " hola ", "  "]]);
        let items = BatchPlanner::default().pending_translations(&g, "en", 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_text, "hola");
    }

    #[test]
    fn batches_respect_ceiling() {
        let planner = BatchPlanner::new(3);
        let items: Vec<WorkItem> = (1..=7)
            .map(|row| WorkItem {
                row_index: row,
                id: translation_item_id("de", row),
                key: format!("k{}", row),
                source_text: "x".to_string(),
            })
            .collect();

        let batches = planner.into_batches(items);
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(batches[2].items[0].row_index, 7);
        assert_eq!(planner.batch_count(7), 3);
        assert_eq!(planner.batch_count(0), 0);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        assert_eq!(BatchPlanner::new(0).batch_size(), 1);
    }

    #[test]
    fn spellcheck_limits_rows() {
        let g = grid(&[
            &["key", "src"],
            &["k1", "uno"],
            &["k2", ""],
            &["k3", "tres"],
            &["k4", "cuatro"],
        ]);
        let items = BatchPlanner::default().pending_spellcheck(&g, 3);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["spell:1", "spell:3"]);
    }
}

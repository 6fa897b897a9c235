use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const KEY_COLUMN: usize = 0;
pub const SOURCE_COLUMN: usize = 1;
pub const FIRST_TARGET_COLUMN: usize = 2;

/// Row-oriented localization sheet. Row 0 is the header.
///
/// Rows may be ragged; a cell past the end of its row reads as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of data rows, excluding the header.
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Writes a cell, padding the row with empty cells as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if col >= cells.len() {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.into();
    }

    pub fn key(&self, row: usize) -> &str {
        self.cell(row, KEY_COLUMN).trim()
    }

    pub fn source_text(&self, row: usize) -> &str {
        self.cell(row, SOURCE_COLUMN).trim()
    }

    /// A row with neither key nor source text is never translated or previewed.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.key(row).is_empty() && self.source_text(row).is_empty()
    }

    /// Trimmed header of the source column, used as the source language name.
    pub fn source_language_header(&self) -> Option<&str> {
        let name = self.cell(0, SOURCE_COLUMN).trim();
        (!name.is_empty()).then_some(name)
    }

    /// Maps lower-cased target language names to their column index.
    pub fn language_columns(&self) -> HashMap<String, usize> {
        self.header()
            .iter()
            .enumerate()
            .skip(FIRST_TARGET_COLUMN)
            .filter_map(|(col, name)| {
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_lowercase(), col))
            })
            .collect()
    }

    pub fn find_language_column(&self, language_name: &str) -> Option<usize> {
        self.language_columns()
            .get(&language_name.trim().to_lowercase())
            .copied()
    }

    /// Returns the column for `language_name`, appending a header cell if absent.
    ///
    /// Appended columns go after the current header width, so existing
    /// columns never move.
    pub fn ensure_language_column(&mut self, language_name: &str) -> usize {
        if let Some(col) = self.find_language_column(language_name) {
            return col;
        }
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        let header = &mut self.rows[0];
        if header.len() < FIRST_TARGET_COLUMN {
            header.resize(FIRST_TARGET_COLUMN, String::new());
        }
        header.push(language_name.to_string());
        header.len() - 1
    }
}

impl From<Vec<Vec<String>>> for Grid {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
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
    fn missing_cells_read_as_empty() {
        let g = grid(&[&["key", "src"], &["k1"]]);
        assert_eq!(g.cell(1, 1), "");
        assert_eq!(g.cell(7, 3), "");
    }

    #[test]
    fn set_cell_pads_short_rows() {
        let mut g = grid(&[&["key", "src", "EN"], &["k1"]]);
        g.set_cell(1, 2, "hello");
        assert_eq!(g.rows()[1], vec!["k1", "", "hello"]);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        let g = grid(&[&["key", "Español", " English ", "French"]]);
        assert_eq!(g.find_language_column("english"), Some(2));
        assert_eq!(g.find_language_column("FRENCH"), Some(3));
        assert_eq!(g.find_language_column("German"), None);
    }

    #[test]
    fn source_column_is_never_a_target() {
        let g = grid(&[&["English", "English"]]);
        assert_eq!(g.find_language_column("English"), None);
    }

    #[test]
    fn ensure_language_column_appends_in_order() {
        let mut g = grid(&[&["key", "src", "EN"]]);
        assert_eq!(g.ensure_language_column("en"), 2);
        assert_eq!(g.ensure_language_column("German"), 3);
        assert_eq!(g.ensure_language_column("French"), 4);
        assert_eq!(g.header(), &["key", "src", "EN", "German", "French"]);
    }

    #[test]
    fn ensure_language_column_pads_narrow_header() {
        let mut g = grid(&[&["key"]]);
        assert_eq!(g.ensure_language_column("German"), 2);
        assert_eq!(g.header(), &["key", "", "German"]);
    }

    #[test]
    fn blank_rows_have_no_key_and_no_source() {
        let g = grid(&[&["key", "src"], &["  ", ""], &["k", ""], &["", "text"]]);
        assert!(g.is_blank_row(1));
        assert!(!g.is_blank_row(2));
        assert!(!g.is_blank_row(3));
    }
}

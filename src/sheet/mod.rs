pub mod analyzer;
pub mod grid;
pub mod planner;
pub mod reader;
pub mod writer;

pub use analyzer::{analyze_sheet, estimate_batch_tokens, estimate_tokens, SheetMetadata};
pub use grid::{Grid, FIRST_TARGET_COLUMN, KEY_COLUMN, SOURCE_COLUMN};
pub use planner::{Batch, BatchPlanner, WorkItem};
pub use reader::load_grid;
pub use writer::{grid_to_csv_string, save_grid, OUTPUT_SHEET_NAME};

use crate::utils::{file_extension, Result, TranslatorError};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match file_extension(path).as_str() {
            ".csv" => Ok(SheetFormat::Csv),
            ".xlsx" => Ok(SheetFormat::Xlsx),
            other => Err(TranslatorError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(SheetFormat::from_path(Path::new("a/b.CSV")).unwrap(), SheetFormat::Csv);
        assert_eq!(SheetFormat::from_path(Path::new("b.xlsx")).unwrap(), SheetFormat::Xlsx);
        assert!(matches!(
            SheetFormat::from_path(Path::new("b.ods")),
            Err(TranslatorError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SheetFormat::from_path(Path::new("noext")),
            Err(TranslatorError::UnsupportedFormat(_))
        ));
    }
}

use crate::sheet::grid::Grid;
use crate::sheet::SheetFormat;
use crate::utils::{Result, TranslatorError};
use std::io::Cursor;
use std::path::Path;

/// Sheet name used when writing workbooks. Other sheets of the original file are not kept.
pub const OUTPUT_SHEET_NAME: &str = "Localization";

/// Writes the grid back in the format implied by the file extension.
pub async fn save_grid(path: &Path, grid: &Grid) -> Result<()> {
    let bytes = match SheetFormat::from_path(path)? {
        SheetFormat::Csv => grid_to_csv_string(grid)?.into_bytes(),
        SheetFormat::Xlsx => grid_to_xlsx_bytes(grid)?,
    };

    tokio::fs::write(path, bytes).await?;
    tracing::debug!(path = %path.display(), rows = grid.len(), "Saved sheet");
    Ok(())
}

/// Empty rows are written as bare line terminators.
pub fn grid_to_csv_string(grid: &Grid) -> Result<String> {
    let mut builder = csv::WriterBuilder::new();
    builder.flexible(true);

    let mut out = Vec::new();
    for row in grid.rows() {
        if row.is_empty() {
            out.push(b'\n');
            continue;
        }
        let mut writer = builder.from_writer(&mut out);
        writer.write_record(row)?;
        writer.flush()?;
    }

    String::from_utf8(out).map_err(|e| TranslatorError::ValidationError(e.to_string()))
}

pub fn grid_to_xlsx_bytes(grid: &Grid) -> Result<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| TranslatorError::SpreadsheetError("default worksheet missing".to_string()))?;
    sheet.set_name(OUTPUT_SHEET_NAME);

    for (row_idx, row) in grid.rows().iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .get_cell_mut(((col_idx as u32) + 1, (row_idx as u32) + 1))
                .set_value_string(value.as_str());
        }
    }

    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf)
        .map_err(|e| TranslatorError::SpreadsheetError(format!("cannot write workbook: {}", e)))?;

    Ok(buf.into_inner())
}

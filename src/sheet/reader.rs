use crate::sheet::grid::Grid;
use crate::sheet::SheetFormat;
use crate::utils::{file_exists, Result, TranslatorError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

/// Loads a localization sheet. Row 0 is taken literally as the header.
pub async fn load_grid(path: &Path) -> Result<Grid> {
    let format = SheetFormat::from_path(path)?;

    if !file_exists(path) {
        return Err(TranslatorError::FileNotFound(path.display().to_string()));
    }

    let rows = match format {
        SheetFormat::Csv => {
            let raw = tokio::fs::read(path).await?;
            parse_csv_rows(&raw)?
        }
        SheetFormat::Xlsx => {
            let bytes = tokio::fs::read(path).await?;
            read_first_sheet(bytes)?
        }
    };

    if rows.is_empty() {
        return Err(TranslatorError::EmptyFile(path.display().to_string()));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "Loaded sheet");
    Ok(Grid::new(rows))
}

/// RFC 4180 parsing: quoted fields may hold commas, quotes and newlines.
///
/// Blank lines are kept as empty rows so row indices match the file.
pub fn parse_csv_rows(raw: &[u8]) -> Result<Vec<Vec<String>>> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw);

    let mut rows: Vec<Vec<String>> = Vec::new();
    push_blank_rows(&mut rows, line_breaks_at(raw, 0));

    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        rows.push(record.iter().map(|s| s.to_string()).collect());

        // The reader may stop anywhere inside the terminator run that follows
        // the record; every break past the first is a blank line.
        let end = content_end(raw, reader.position().byte() as usize);
        push_blank_rows(&mut rows, line_breaks_at(raw, end).saturating_sub(1));
    }
    Ok(rows)
}

fn push_blank_rows(rows: &mut Vec<Vec<String>>, count: usize) {
    rows.extend(std::iter::repeat_with(Vec::new).take(count));
}

fn content_end(raw: &[u8], pos: usize) -> usize {
    let mut end = pos.min(raw.len());
    while end > 0 && matches!(raw[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    end
}

/// Line breaks in the run of terminators starting at `from`. CRLF counts once.
fn line_breaks_at(raw: &[u8], from: usize) -> usize {
    let mut i = from;
    let mut breaks = 0;
    while i < raw.len() {
        match raw[i] {
            b'\r' => {
                i += 1;
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => i += 1,
            _ => break,
        }
        breaks += 1;
    }
    breaks
}

/// Reads the first worksheet of a workbook into string rows.
pub fn read_first_sheet(bytes: Vec<u8>) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| TranslatorError::SpreadsheetError(format!("cannot open workbook: {}", e)))?;

    let sheet_name = match workbook.sheet_names().first() {
        Some(name) => name.clone(),
        None => return Ok(Vec::new()),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| TranslatorError::SpreadsheetError(format!("cannot read {}: {}", sheet_name, e)))?;

    // The used range may start below/right of A1; keep absolute positions.
    let (row_offset, col_offset) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Ok(Vec::new()),
    };

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(data_to_string));
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }

    Ok(rows)
}

pub fn data_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}

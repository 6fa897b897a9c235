use crate::sheet::reader::{parse_csv_rows, read_first_sheet};
use crate::utils::{file_extension, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Shared prompt material for one run, computed once and read by every batch.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub context_snippet: String,
    pub glossary_snippet: String,
}

impl PromptContext {
    pub async fn load(contexts: &[PathBuf], glossaries: &[PathBuf], max_chars: usize) -> Self {
        let (context_snippet, glossary_snippet) = tokio::join!(
            aggregate_context(contexts, max_chars),
            aggregate_glossary(glossaries, max_chars)
        );
        Self {
            context_snippet,
            glossary_snippet,
        }
    }
}

/// Character-budgeted string builder. Never grows past `max_chars`.
struct Budget {
    text: String,
    used: usize,
    max_chars: usize,
}

impl Budget {
    fn new(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            used: 0,
            max_chars,
        }
    }

    fn remaining(&self) -> usize {
        self.max_chars.saturating_sub(self.used)
    }

    /// Appends `piece` only if it fits entirely.
    fn try_push(&mut self, piece: &str) -> bool {
        let len = piece.chars().count();
        if len > self.remaining() {
            return false;
        }
        self.text.push_str(piece);
        self.used += len;
        true
    }

    /// Appends as much of `piece` as fits.
    fn push_truncated(&mut self, piece: &str) {
        let take = self.remaining();
        let end = piece
            .char_indices()
            .nth(take)
            .map(|(idx, _)| idx)
            .unwrap_or(piece.len());
        self.push_unchecked(&piece[..end]);
    }

    fn push_unchecked(&mut self, piece: &str) {
        self.used += piece.chars().count();
        self.text.push_str(piece);
    }

    fn finish(self) -> String {
        self.text.trim().to_string()
    }
}

/// Concatenates free-text context files, each tagged with its file name.
///
/// Unreadable files are skipped.
pub async fn aggregate_context(paths: &[PathBuf], max_chars: usize) -> String {
    let mut budget = Budget::new(max_chars);

    for path in paths {
        if budget.remaining() == 0 {
            break;
        }
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable context file");
                continue;
            }
        };

        let tag = format!("\n\n[Context: {}]\n", file_name(path));
        if !budget.try_push(&tag) {
            break;
        }
        budget.push_truncated(&content);
    }

    budget.finish()
}

/// Renders two-column glossary tables as `Term: <term> -> Translation: <translation>` lines.
///
/// Stops at the first line that would exceed `max_chars`. Unreadable files are skipped.
pub async fn aggregate_glossary(paths: &[PathBuf], max_chars: usize) -> String {
    let mut budget = Budget::new(max_chars);

    for path in paths {
        if budget.remaining() == 0 {
            break;
        }
        let entries = match read_glossary_entries(path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable glossary file");
                continue;
            }
        };

        for (term, translation) in entries {
            let line = format!("Term: {} -> Translation: {}\n", term, translation);
            if !budget.try_push(&line) {
                return budget.finish();
            }
        }
    }

    budget.finish()
}

/// Data rows (header skipped) with both cells non-empty.
pub async fn read_glossary_entries(path: &Path) -> Result<Vec<(String, String)>> {
    let rows = match file_extension(path).as_str() {
        ".csv" => parse_csv_rows(&tokio::fs::read(path).await?)?,
        ".xlsx" => read_first_sheet(tokio::fs::read(path).await?)?,
        other => {
            warn!(path = %path.display(), extension = %other, "Unsupported glossary format");
            return Ok(Vec::new());
        }
    };

    Ok(rows
        .into_iter()
        .skip(1)
        .filter_map(|row| {
            let term = row.first()?.trim();
            let translation = row.get(1)?.trim();
            (!term.is_empty() && !translation.is_empty())
                .then(|| (term.to_string(), translation.to_string()))
        })
        .collect())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn context_files_are_tagged_and_capped() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("lore.txt");
        let b = dir.path().join("style.txt");
        std::fs::write(&a, "The kingdom of Aria.").unwrap();
        std::fs::write(&b, "x".repeat(500)).unwrap();

        let text = aggregate_context(&[a, b], 80).await;
        assert!(text.starts_with("[Context: lore.txt]\nThe kingdom of Aria."));
        assert!(text.contains("[Context: style.txt]"));
        assert!(text.chars().count() <= 80);
    }

    #[tokio::test]
    async fn missing_context_file_is_skipped() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "useful").unwrap();

        let text = aggregate_context(&[dir.path().join("nope.txt"), good], 1000).await;
        assert_eq!(text, "[Context: good.txt]\nuseful");
    }

    #[tokio::test]
    async fn glossary_stops_at_entry_boundary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glossary.csv");
        // Each rendered line is 30 chars, three lines are 90.
        std::fs::write(&path, "term,translation\naaa,bbb\nccc,ddd\neee,fff\n").unwrap();

        let text = aggregate_glossary(&[path], 50).await;
        assert!(text.chars().count() <= 50);
        assert_eq!(text, "Term: aaa -> Translation: bbb");
    }

    #[tokio::test]
    async fn glossary_skips_incomplete_rows_and_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glossary.csv");
        std::fs::write(&path, "Term,Translation\nsword,espada\nshield,\n,lanza\n").unwrap();

        let text = aggregate_glossary(&[path], 8000).await;
        assert_eq!(text, "Term: sword -> Translation: espada");
    }

    #[tokio::test]
    async fn unsupported_glossary_yields_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glossary.txt");
        std::fs::write(&path, "sword,espada").unwrap();
        assert_eq!(aggregate_glossary(&[path], 8000).await, "");
    }
}

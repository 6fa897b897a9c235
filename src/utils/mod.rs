pub mod config;
pub mod errors;

pub use config::{AppConfig, ApiConfig, Credentials, SpellCheckDefaults, TranslationDefaults};
pub use errors::{Result, TranslatorError};

use std::path::Path;

/// Lower-cased file extension including the dot, e.g. `".csv"`.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),

    #[error("Unsupported file format: {0}. Use .csv or .xlsx")]
    UnsupportedFormat(String),

    #[error("Localization file is empty: {0}")]
    EmptyFile(String),

    #[error("No translation provider configured: {0}")]
    NoProviderConfigured(String),

    #[error("{provider} returned HTTP {status}: {body}")]
    ProviderHttp {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl TranslatorError {
    /// Errors raised before any provider call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TranslatorError::UnsupportedFormat(_)
                | TranslatorError::EmptyFile(_)
                | TranslatorError::FileNotFound(_)
                | TranslatorError::NoProviderConfigured(_)
                | TranslatorError::ValidationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;

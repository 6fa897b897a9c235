pub mod providers;
pub mod server;
pub mod sheet;
pub mod translation;
pub mod utils;

pub use providers::{
    ActiveProvider, ProviderKind, ProviderMode, ProviderOptions, ResultItem, TargetLanguage,
    TranslationProvider,
};
pub use server::{
    AnalyzeSheetParams, LocSheetServer, SpellCheckSheetParams, TranslateSheetParams, Workbench,
};
pub use sheet::{analyze_sheet, load_grid, save_grid, Grid, SheetMetadata};
pub use translation::{
    spell_check_file, translate_file, ProgressEvent, ProgressReporter, SpellCheckRequest,
    SpellCheckResult, TranslateFileRequest, TranslateFileResult,
};
pub use utils::{AppConfig, Credentials, Result, TranslatorError};

use crate::providers::{ProviderMode, TargetLanguage};
use crate::server::Workbench;
use crate::utils::TranslatorError;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for analyzing a localization sheet")]
pub struct AnalyzeSheetParams {
    #[schemars(description = "Path to the .csv or .xlsx file to analyze")]
    pub file_path: String,
    #[schemars(description = "Number of sample rows to return (default: 10)")]
    pub sample_rows: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for translating the missing cells of a localization sheet")]
pub struct TranslateSheetParams {
    #[schemars(description = "Path to the .csv or .xlsx file; it is updated in place")]
    pub file_path: String,
    #[schemars(description = "Target languages as {code, name}; name must match the column header")]
    pub target_languages: Vec<TargetLanguage>,
    #[schemars(description = "Display name of the source language (default: header of column 2)")]
    pub source_language_name: Option<String>,
    #[schemars(description = "Free-text context files included in every prompt")]
    #[serde(default)]
    pub contexts: Vec<String>,
    #[schemars(description = "Two-column term/translation glossary files (.csv or .xlsx)")]
    #[serde(default)]
    pub glossaries: Vec<String>,
    #[schemars(description = "Which providers to use: openai, gemini or both (default: both)")]
    pub provider_mode: Option<ProviderMode>,
    #[schemars(description = "OpenAI model id")]
    pub openai_model: Option<String>,
    #[schemars(description = "Gemini model id")]
    pub gemini_model: Option<String>,
    #[schemars(description = "Rows per provider call (default: 40)")]
    pub max_rows_per_batch: Option<usize>,
    #[schemars(description = "Character budget for context and glossary each (default: 8000)")]
    pub max_context_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for spell-checking the source column of a localization sheet")]
pub struct SpellCheckSheetParams {
    #[schemars(description = "Path to the .csv or .xlsx file")]
    pub file_path: String,
    #[schemars(description = "Language of the source column (default: Español)")]
    pub language: Option<String>,
    #[schemars(description = "Number of data rows to check (default: 200, max: 500)")]
    pub max_rows: Option<usize>,
    #[schemars(description = "Write corrections back to the file (default: true)")]
    pub apply_to_file: Option<bool>,
    #[schemars(description = "Which providers to use: openai, gemini or both (default: both)")]
    pub provider_mode: Option<ProviderMode>,
    #[schemars(description = "OpenAI model id")]
    pub openai_model: Option<String>,
    #[schemars(description = "Gemini model id")]
    pub gemini_model: Option<String>,
}

fn to_mcp_error(e: TranslatorError) -> McpError {
    if e.is_input_error() {
        McpError::invalid_params(e.to_string(), None)
    } else {
        McpError::internal_error(e.to_string(), None)
    }
}

fn json_content<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json_result = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json_result)]))
}

#[derive(Clone)]
pub struct LocSheetServer {
    workbench: Workbench,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LocSheetServer {
    pub fn new(workbench: Workbench) -> Self {
        Self {
            workbench,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "analyze_sheet",
        description = "Analyze a localization sheet (.csv or .xlsx). Returns row and column counts, detected source and target languages, pending cells per language, file size, estimated tokens and sample rows."
    )]
    async fn analyze_sheet(
        &self,
        params: Parameters<AnalyzeSheetParams>,
    ) -> Result<CallToolResult, McpError> {
        let metadata = self.workbench.analyze(params.0).await.map_err(to_mcp_error)?;
        json_content(&metadata)
    }

    #[tool(
        name = "translate_sheet",
        description = "Translate every empty target-language cell of a localization sheet with OpenAI and/or Gemini, merge the answers, and save the file in place. Returns a preview with per-provider texts and a confidence score, plus the full CSV content."
    )]
    async fn translate_sheet(
        &self,
        params: Parameters<TranslateSheetParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.workbench.translate(params.0).await.map_err(to_mcp_error)?;
        json_content(&result)
    }

    #[tool(
        name = "spell_check_sheet",
        description = "Fix spelling and grammar in the source column of a localization sheet. Set apply_to_file=false to preview the corrections without saving."
    )]
    async fn spell_check_sheet(
        &self,
        params: Parameters<SpellCheckSheetParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.workbench.spell_check(params.0).await.map_err(to_mcp_error)?;
        json_content(&result)
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }
}

#[tool_handler]
impl rmcp::handler::server::ServerHandler for LocSheetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"Localization Sheet Translator MCP Server

Sheets use column 1 for keys, column 2 for the source text, and one column per target language named in the header row.

Workflow:
1. analyze_sheet - Inspect the file and see how many cells are missing per language
2. spell_check_sheet - Optionally clean up the source column (apply_to_file=false to preview)
3. translate_sheet - Fill the missing cells; the file is saved once at the end

Credentials are read from OPENAI_API_KEY and GEMINI_API_KEY. All file paths are local paths."#
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_params_accept_minimal_json() {
        let params: TranslateSheetParams = serde_json::from_str(
            r#"{"file_path":"/tmp/a.csv","target_languages":[{"code":"en","name":"English"}],"provider_mode":"openai"}"#,
        )
        .unwrap();
        assert!(params.contexts.is_empty());
        assert_eq!(params.provider_mode, Some(ProviderMode::OpenAi));
        assert_eq!(params.target_languages[0].name, "English");
    }

    #[test]
    fn input_errors_map_to_invalid_params() {
        let err = to_mcp_error(TranslatorError::UnsupportedFormat(".txt".into()));
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = to_mcp_error(TranslatorError::ProviderHttp {
            provider: "openai".into(),
            status: 401,
            body: "bad key".into(),
        });
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }
}

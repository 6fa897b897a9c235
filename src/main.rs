use locsheet_translator::{AppConfig, LocSheetServer, Workbench};
use rmcp::{transport::stdio, ServiceExt};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(Some("config.toml"));
    init_tracing(&config)?;

    let args: Vec<String> = env::args().collect();
    tracing::info!("Loaded configuration: {:?}", config.server.name);

    let workbench = Workbench::from_env(config);

    if args.len() > 1 && args[1] == "--http" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(9527);

        let bind_addr = args
            .get(3)
            .map(|s| s.as_str())
            .unwrap_or("127.0.0.1");

        run_http_server(workbench, bind_addr, port).await?;
    } else {
        tracing::info!("Starting MCP Server on stdio");
        let server = LocSheetServer::new(workbench);
        let service = server.serve(stdio()).await?;
        service.waiting().await?;
    }

    tracing::info!("MCP Server shutting down");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let directive = format!("locsheet_translator={}", config.logging.level);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

async fn run_http_server(workbench: Workbench, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    use axum::{
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use locsheet_translator::{
        AnalyzeSheetParams, SheetMetadata, SpellCheckResult, SpellCheckSheetParams,
        TranslateFileResult, TranslateSheetParams, TranslatorError,
    };

    struct ApiError(TranslatorError);

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let status = match &self.0 {
                e if e.is_input_error() => StatusCode::BAD_REQUEST,
                TranslatorError::ProviderHttp { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
        }
    }

    async fn health() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "ok",
            "service": "locsheet-translator",
            "version": env!("CARGO_PKG_VERSION")
        }))
    }

    async fn info(State(workbench): State<Workbench>) -> impl IntoResponse {
        let config = workbench.config();
        Json(serde_json::json!({
            "name": config.server.name,
            "version": config.server.version,
            "description": "Batch LLM translation for CSV/XLSX localization sheets - HTTP Mode",
            "defaults": {
                "max_rows_per_batch": config.translation.max_rows_per_batch,
                "max_context_chars": config.translation.max_context_chars,
                "openai_model": config.api.openai_model,
                "gemini_model": config.api.gemini_model
            },
            "endpoints": {
                "GET /health": "Health check",
                "GET /info": "Server info",
                "POST /analyze": "Analyze a sheet",
                "POST /translate": "Translate missing cells",
                "POST /spellcheck": "Spell-check the source column"
            }
        }))
    }

    async fn analyze_handler(
        State(workbench): State<Workbench>,
        Json(params): Json<AnalyzeSheetParams>,
    ) -> Result<Json<SheetMetadata>, ApiError> {
        workbench.analyze(params).await.map(Json).map_err(ApiError)
    }

    async fn translate_handler(
        State(workbench): State<Workbench>,
        Json(params): Json<TranslateSheetParams>,
    ) -> Result<Json<TranslateFileResult>, ApiError> {
        workbench.translate(params).await.map(Json).map_err(ApiError)
    }

    async fn spellcheck_handler(
        State(workbench): State<Workbench>,
        Json(params): Json<SpellCheckSheetParams>,
    ) -> Result<Json<SpellCheckResult>, ApiError> {
        workbench.spell_check(params).await.map(Json).map_err(ApiError)
    }

    let app = Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/analyze", post(analyze_handler))
        .route("/translate", post(translate_handler))
        .route("/spellcheck", post(spellcheck_handler))
        .with_state(workbench);

    let addr = format!("{}:{}", bind_addr, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP Server listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /info       - Server info");
    tracing::info!("  POST /analyze    - Analyze a sheet");
    tracing::info!("  POST /translate  - Translate missing cells");
    tracing::info!("  POST /spellcheck - Spell-check the source column");
    tracing::info!(
        "Example: curl -X POST http://{}/analyze -H 'Content-Type: application/json' -d '{{\"file_path\": \"/path/to/strings.csv\"}}'",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}

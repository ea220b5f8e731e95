use crate::enums::{extract_enums, render_enum_html, EnumTable};
use crate::json_processor::{analyze_document, parse_json_str, to_pretty_string, DocumentMetadata};
use crate::state::AppState;
use crate::translation::{
    build_system_prompt, start_translation_session, TranslationClient, TranslationPipeline,
    TranslationReport, TranslationSession,
};
use crate::utils::{escape_html, JsonTranslatorError, TranslationSessionConfig};
use axum::{
    extract::{DefaultBodyLimit, Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedState = Arc<RwLock<AppState>>;

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let shared_state: SharedState = Arc::new(RwLock::new(state));

    Router::new()
        .route("/", get(form_page))
        .route("/translate", post(translate_form))
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/api/translate", post(translate_api))
        .route("/api/analyze", post(analyze_api))
        .route("/api/enums", post(enums_api))
        .route("/api/sessions", post(start_session_api))
        .route("/api/progress/{session_id}", get(progress_api))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(shared_state)
}

pub async fn serve(state: AppState, bind_addr: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind_addr, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP Server listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                      - Translation form");
    tracing::info!("  POST /translate             - Form submit, returns translated JSON");
    tracing::info!("  POST /api/translate         - Translate a JSON document");
    tracing::info!("  POST /api/analyze           - Count translatable strings");
    tracing::info!("  POST /api/enums             - Extract enum tables");
    tracing::info!("  POST /api/sessions          - Start a background file translation");
    tracing::info!("  GET  /api/progress/:id      - Session progress");
    tracing::info!("  GET  /health, GET /info");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Error body shared by the JSON endpoints.
pub struct ApiError(JsonTranslatorError);

impl From<JsonTranslatorError> for ApiError {
    fn from(e: JsonTranslatorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TranslateForm {
    pub document: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub document: Value,
    pub system_prompt: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub document: Value,
    pub report: TranslationReport,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub input_file: String,
    pub output_file: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub document: Value,
    pub batch_size: Option<usize>,
    pub sample_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EnumsRequest {
    pub schema: Value,
    pub api_id: String,
    #[serde(default)]
    pub render_html: bool,
}

#[derive(Debug, Serialize)]
pub struct EnumsResponse {
    pub api_id: String,
    pub tables: Vec<EnumTable>,
    pub html: Option<String>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "json-translator-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "json-translator-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Translate Chinese strings in JSON documents - HTTP Mode",
        "endpoints": {
            "GET /": "Translation form",
            "POST /translate": "Form submit (document, system_prompt, file_name)",
            "POST /api/translate": "Translate {document, system_prompt?, batch_size?}",
            "POST /api/analyze": "Analyze {document, batch_size?, sample_size?}",
            "POST /api/enums": "Extract enums {schema, api_id, render_html?}",
            "POST /api/sessions": "Translate a file in the background {input_file, output_file}",
            "GET /api/progress/{session_id}": "Get session progress",
            "GET /health": "Health check",
            "GET /info": "Server info"
        }
    }))
}

async fn form_page(State(state): State<SharedState>) -> Html<String> {
    let state = state.read().await;
    Html(render_form_page(&build_system_prompt(&state.config)))
}

/// Form submit: parses the pasted document, translates it and returns it as a download.
async fn translate_form(
    State(state): State<SharedState>,
    Form(form): Form<TranslateForm>,
) -> Response {
    let document = match parse_json_str(&form.document) {
        Ok(document) => document,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Html(render_message_page("Invalid JSON", &e.to_string())),
            )
                .into_response()
        }
    };

    let config = request_config(&state, Some(form.system_prompt), None).await;
    let result = async {
        let outcome = run_translation(config, &document).await?;
        let body = to_pretty_string(&outcome.document)?;
        Ok::<_, JsonTranslatorError>((body, outcome.report))
    }
    .await;

    match result {
        Ok((body, report)) => {
            if !report.is_complete() {
                tracing::warn!(
                    failed_batches = report.failures.len(),
                    untranslated = report.entries_untranslated(),
                    "Some batches kept their original text"
                );
            }
            let disposition = format!(
                "attachment; filename=\"{}\"",
                download_name(&form.file_name)
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(render_message_page("Translation failed", &e.to_string())),
        )
            .into_response(),
    }
}

async fn translate_api(
    State(state): State<SharedState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let config = request_config(&state, request.system_prompt, request.batch_size).await;
    config.validate()?;

    let outcome = run_translation(config, &request.document).await?;
    Ok(Json(TranslateResponse {
        document: outcome.document,
        report: outcome.report,
    }))
}

async fn analyze_api(
    State(state): State<SharedState>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<DocumentMetadata> {
    let state = state.read().await;
    Json(analyze_document(
        &request.document,
        request.batch_size.unwrap_or(state.config.batch_size),
        &state.config.delimiter,
        request.sample_size.unwrap_or(10),
    ))
}

async fn enums_api(Json(request): Json<EnumsRequest>) -> Json<EnumsResponse> {
    let tables = extract_enums(&request.schema, &request.api_id);
    let html = if request.render_html {
        render_enum_html(&tables)
    } else {
        None
    };
    Json(EnumsResponse {
        api_id: request.api_id,
        tables,
        html,
    })
}

async fn start_session_api(
    State(state): State<SharedState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<TranslationSession>, ApiError> {
    let state = state.read().await;
    let session = start_translation_session(
        &request.input_file,
        &request.output_file,
        &state.config,
        state.sessions.clone(),
    )
    .await?;

    tracing::info!(session_id = %session.session_id, input = %request.input_file, "Translation session started");
    Ok(Json(session))
}

async fn progress_api(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<TranslationSession>, ApiError> {
    let state = state.read().await;
    match state.session(&session_id).await {
        Some(session) => Ok(Json(TranslationSession::from(&session))),
        None => Err(JsonTranslatorError::SessionNotFound(session_id).into()),
    }
}

async fn request_config(
    state: &SharedState,
    system_prompt: Option<String>,
    batch_size: Option<usize>,
) -> TranslationSessionConfig {
    let mut config = state.read().await.config.clone();
    if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
        config.system_prompt = Some(prompt);
    }
    if let Some(batch_size) = batch_size {
        config.batch_size = batch_size;
    }
    config
}

async fn run_translation(
    config: TranslationSessionConfig,
    document: &Value,
) -> crate::utils::Result<crate::translation::TranslationOutcome> {
    let client = TranslationClient::new(config.clone())?;
    TranslationPipeline::new(client, &config)
        .translate_document(document, None)
        .await
}

fn download_name(file_name: &str) -> String {
    let base: String = file_name
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '/' | '\r' | '\n'))
        .collect();
    if base.is_empty() {
        "translated.json".to_string()
    } else {
        format!("translated_{}", base)
    }
}

pub fn render_form_page(system_prompt: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh">
<head>
<meta charset="utf-8">
<title>JSON Translator</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2em auto; padding: 0 1em; }}
textarea {{ width: 100%; font-family: monospace; }}
label {{ display: block; margin-top: 1em; font-weight: bold; }}
button {{ margin-top: 1em; padding: 0.5em 2em; }}
</style>
</head>
<body>
<h1>JSON Translator</h1>
<p>粘贴一个包含中文的 JSON 文档，系统将其中的中文部分翻译为英文。</p>
<form method="post" action="/translate">
<label for="system_prompt">提示词（可在此维护自定义术语）</label>
<textarea id="system_prompt" name="system_prompt" rows="14">{}</textarea>
<label for="file_name">文件名</label>
<input id="file_name" name="file_name" type="text" placeholder="document.json">
<label for="document">JSON 文档</label>
<textarea id="document" name="document" rows="20" required></textarea>
<button type="submit">翻译并下载</button>
</form>
</body>
</html>
"#,
        escape_html(system_prompt)
    )
}

fn render_message_page(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{0}</title></head><body><h1>{0}</h1><pre>{1}</pre><p><a href=\"/\">Back</a></p></body></html>\n",
        escape_html(title),
        escape_html(message)
    )
}

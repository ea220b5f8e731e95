use crate::enums::{extract_enums, render_enum_html};
use crate::json_processor::{analyze_json_file, to_pretty_string, JsonDocumentReader};
use crate::state::AppState;
use crate::translation::{
    start_translation_session, TranslationClient, TranslationPipeline, TranslationSession,
};
use crate::utils::GlossaryTerm;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for analyzing a JSON file")]
pub struct AnalyzeJsonParams {
    #[schemars(description = "Path to the JSON file to analyze")]
    pub file_path: String,
    #[schemars(description = "Number of translatable strings to return as a sample (default: 10)")]
    pub sample_size: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Translation configuration parameters; omitted fields keep their value")]
pub struct ConfigureTranslationParams {
    #[schemars(description = "Source language name (e.g., 'Chinese')")]
    pub source_lang: Option<String>,
    #[schemars(description = "Target language name (e.g., 'English')")]
    pub target_lang: Option<String>,
    #[schemars(description = "Number of strings sent per request (default: 30)")]
    pub batch_size: Option<usize>,
    #[schemars(description = "Glossary terms that must be translated a fixed way; replaces the current glossary")]
    pub glossary: Option<Vec<GlossaryTerm>>,
    #[schemars(description = "Full system instruction replacing the generated one; empty string restores the default")]
    pub system_prompt: Option<String>,
    #[schemars(description = "Model name sent to the completion endpoint")]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters to translate a JSON file in the background")]
pub struct TranslateJsonParams {
    #[schemars(description = "Path to input JSON file")]
    pub input_file: String,
    #[schemars(description = "Path to output JSON file")]
    pub output_file: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters to translate an inline JSON document")]
pub struct TranslateDocumentParams {
    #[schemars(description = "The JSON document whose Chinese strings should be translated")]
    pub document: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters to get translation progress")]
pub struct GetProgressParams {
    #[schemars(description = "Session ID to get progress for")]
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters to extract enum tables from an API documentation export")]
pub struct ExtractEnumsParams {
    #[schemars(description = "Path to the exported schema JSON (with apiCollection and schemaCollection)")]
    pub schema_file: String,
    #[schemars(description = "ID of the API whose enums should be extracted")]
    pub api_id: String,
    #[schemars(description = "Also render the tables as an HTML fragment (default: false)")]
    pub render_html: Option<bool>,
}

#[derive(Clone)]
pub struct JsonTranslatorServer {
    state: Arc<RwLock<AppState>>,
    tool_router: ToolRouter<Self>,
}

fn internal_error(e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

#[tool_router]
impl JsonTranslatorServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "analyze_json",
        description = "Analyze a JSON file without translating it. Returns the number of strings, how many contain Chinese, the number of batches and an estimated token count."
    )]
    async fn analyze_json(
        &self,
        params: Parameters<AnalyzeJsonParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let state = self.state.read().await;

        let metadata = analyze_json_file(
            &params.file_path,
            state.config.batch_size,
            &state.config.delimiter,
            params.sample_size.unwrap_or(10),
        )
        .await
        .map_err(internal_error)?;

        let json_result = serde_json::to_string_pretty(&metadata).map_err(internal_error)?;

        Ok(CallToolResult::success(vec![Content::text(json_result)]))
    }

    #[tool(
        name = "configure_translation",
        description = "Configure translation parameters: languages, batch size, glossary, system instruction and model. Applies to translations started afterwards."
    )]
    async fn configure_translation(
        &self,
        params: Parameters<ConfigureTranslationParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let mut state = self.state.write().await;

        let mut config = state.config.clone();
        if let Some(source) = params.source_lang {
            config.source_lang = source;
        }
        if let Some(target) = params.target_lang {
            config.target_lang = target;
        }
        if let Some(batch_size) = params.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(glossary) = params.glossary {
            config.glossary = glossary;
        }
        if let Some(prompt) = params.system_prompt {
            config.system_prompt = if prompt.trim().is_empty() {
                None
            } else {
                Some(prompt)
            };
        }
        if let Some(model) = params.model {
            config.model = model;
        }

        config
            .validate()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        state.config = config;

        let response = serde_json::json!({
            "status": "configured",
            "config": state.config,
            "message": "Translation configured. Call translate_json or translate_document to start."
        });

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&response).map_err(internal_error)?,
        )]))
    }

    #[tool(
        name = "translate_json",
        description = "Translate every Chinese string of a JSON file and write the result to output_file. Runs in the background; returns a session_id to poll with get_translation_progress."
    )]
    async fn translate_json(
        &self,
        params: Parameters<TranslateJsonParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let state = self.state.read().await;

        let session = start_translation_session(
            &params.input_file,
            &params.output_file,
            &state.config,
            state.sessions.clone(),
        )
        .await
        .map_err(|e| {
            if e.is_client_error() {
                McpError::invalid_params(e.to_string(), None)
            } else {
                internal_error(e)
            }
        })?;

        tracing::info!(session_id = %session.session_id, input = %params.input_file, "Translation session started");

        let json_result = serde_json::to_string_pretty(&session).map_err(internal_error)?;
        Ok(CallToolResult::success(vec![Content::text(json_result)]))
    }

    #[tool(
        name = "translate_document",
        description = "Translate the Chinese strings of an inline JSON document and return the translated document together with a report of batches that could not be translated."
    )]
    async fn translate_document(
        &self,
        params: Parameters<TranslateDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let config = self.state.read().await.config.clone();

        let client = TranslationClient::new(config.clone()).map_err(internal_error)?;
        let pipeline = TranslationPipeline::new(client, &config);
        let outcome = pipeline
            .translate_document(&params.document, None)
            .await
            .map_err(internal_error)?;

        let response = serde_json::json!({
            "document": outcome.document,
            "report": outcome.report,
        });

        Ok(CallToolResult::success(vec![Content::text(
            to_pretty_string(&response).map_err(internal_error)?,
        )]))
    }

    #[tool(
        name = "get_translation_progress",
        description = "Get the current progress of a translation session."
    )]
    async fn get_translation_progress(
        &self,
        params: Parameters<GetProgressParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let state = self.state.read().await;

        match state.session(&params.session_id).await {
            Some(session_state) => {
                let response = TranslationSession::from(&session_state);
                let json_result =
                    serde_json::to_string_pretty(&response).map_err(internal_error)?;
                Ok(CallToolResult::success(vec![Content::text(json_result)]))
            }
            None => Err(McpError::invalid_params(
                format!("Session not found: {}", params.session_id),
                None,
            )),
        }
    }

    #[tool(
        name = "extract_enums",
        description = "Extract the enum value tables used by one API from an exported API documentation schema, following $ref links into the shared models. Optionally renders them as HTML."
    )]
    async fn extract_enums(
        &self,
        params: Parameters<ExtractEnumsParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;

        let schema = JsonDocumentReader::new(&params.schema_file)
            .read()
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let tables = extract_enums(&schema, &params.api_id);
        let html = if params.render_html.unwrap_or(false) {
            render_enum_html(&tables)
        } else {
            None
        };

        let response = serde_json::json!({
            "api_id": params.api_id,
            "tables": tables,
            "html": html,
        });

        Ok(CallToolResult::success(vec![Content::text(
            to_pretty_string(&response).map_err(internal_error)?,
        )]))
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }
}

#[tool_handler]
impl rmcp::handler::server::ServerHandler for JsonTranslatorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"JSON Translator MCP Server

Translates the Chinese strings inside JSON documents to English through a chat-completion API,
keeping the document structure, key order and non-Chinese values unchanged.

Workflow:
1. analyze_json - See how many strings need translation (use absolute paths)
2. configure_translation - Optional: languages, batch size, glossary, system instruction
3. translate_json - Start a background translation, get session_id
4. get_translation_progress - Poll until status is completed
   (or translate_document for small inline documents)

Batches the service cannot translate keep their original text and are listed in the report.
extract_enums returns the enum tables of one API from an API documentation export."#
                    .to_string(),
            ),
        }
    }
}

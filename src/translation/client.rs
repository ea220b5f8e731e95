use crate::translation::prompt::build_system_prompt;
use crate::translation::Translate;
use crate::utils::{ApiProvider, JsonTranslatorError, Result, TranslationSessionConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible chat-completion client. One request per call, no retries here.
pub struct TranslationClient {
    client: Client,
    config: TranslationSessionConfig,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl TranslationClient {
    pub fn new(config: TranslationSessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let system_prompt = build_system_prompt(&config);

        Ok(Self {
            client,
            config,
            system_prompt,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &TranslationSessionConfig {
        &self.config
    }

    async fn call_api(&self, user_text: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &self.system_prompt,
                },
                Message {
                    role: "user",
                    content: user_text,
                },
            ],
            temperature: self.config.temperature,
        };

        let builder = self
            .client
            .post(&self.config.api_endpoint)
            .header("Content-Type", "application/json");
        let builder = match self.config.provider {
            ApiProvider::OpenAi => builder.bearer_auth(&self.config.api_key),
            ApiProvider::Azure => builder.header("api-key", &self.config.api_key),
        };

        let response = builder.json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JsonTranslatorError::ApiError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: ChatCompletionResponse = response.json().await?;
        extract_completion_text(api_response)
    }
}

fn extract_completion_text(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| JsonTranslatorError::ApiError("No text content in response".to_string()))
}

impl Translate for TranslationClient {
    async fn translate(&self, text: &str) -> Result<String> {
        tracing::debug!(
            model = %self.config.model,
            chars = text.chars().count(),
            "Sending translation request"
        );
        self.call_api(text).await
    }
}

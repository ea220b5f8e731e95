use thiserror::Error;

#[derive(Error, Debug)]
pub enum JsonTranslatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Segment count mismatch: expected {expected}, got {got}")]
    SegmentCountMismatch { expected: usize, got: usize },

    #[error("Translation count mismatch: document has {expected} translatable strings, got {got} translations")]
    TranslationCountMismatch { expected: usize, got: usize },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Translation failed after retries: {0}")]
    TranslationFailed(String),
}

pub type Result<T> = std::result::Result<T, JsonTranslatorError>;

impl JsonTranslatorError {
    /// Errors caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JsonTranslatorError::ValidationError(_)
                | JsonTranslatorError::JsonError(_)
                | JsonTranslatorError::FileNotFound(_)
                | JsonTranslatorError::SessionNotFound(_)
                | JsonTranslatorError::TranslationCountMismatch { .. }
        )
    }
}

use crate::utils::Result;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

const INDENT: &[u8] = b"    ";

/// Serializes with 4-space indentation. Non-ASCII text is written literally.
pub fn to_pretty_string(value: &Value) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub struct JsonDocumentWriter {
    path: String,
}

impl JsonDocumentWriter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Writes the document, creating parent directories as needed. Returns bytes written.
    pub async fn write(&self, value: &Value) -> Result<usize> {
        let text = to_pretty_string(value)?;

        if let Some(parent) = std::path::Path::new(&self.path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, text.as_bytes()).await?;

        tracing::debug!(path = %self.path, bytes = text.len(), "Wrote JSON document");
        Ok(text.len())
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

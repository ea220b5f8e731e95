use crate::utils::{JsonTranslatorError, Result};
use serde_json::Value;
use std::path::Path;

pub struct JsonDocumentReader {
    path: String,
}

impl JsonDocumentReader {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Reads and parses the whole file. Malformed input fails here, before any translation.
    pub async fn read(&self) -> Result<Value> {
        if !file_exists(&self.path) {
            return Err(JsonTranslatorError::FileNotFound(self.path.clone()));
        }

        let bytes = tokio::fs::read(&self.path).await?;
        let value = parse_json_bytes(&bytes)?;

        tracing::debug!(path = %self.path, bytes = bytes.len(), "Loaded JSON document");
        Ok(value)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

pub fn parse_json_str(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Parses UTF-8 bytes, tolerating a leading byte-order mark.
pub fn parse_json_bytes(bytes: &[u8]) -> Result<Value> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn get_file_size(path: &str) -> Result<u64> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata.len())
}

pub fn file_exists(path: &str) -> bool {
    Path::new(path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"名称": "发票", "count": 2}"#).unwrap();

        let reader = JsonDocumentReader::new(path.to_str().unwrap());
        let value = reader.read().await.unwrap();
        assert_eq!(value, json!({"名称": "发票", "count": 2}));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let reader = JsonDocumentReader::new("/no/such/file.json");
        assert!(matches!(
            reader.read().await,
            Err(JsonTranslatorError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"a": "未闭合"#).unwrap();

        let reader = JsonDocumentReader::new(path.to_str().unwrap());
        assert!(matches!(
            reader.read().await,
            Err(JsonTranslatorError::JsonError(_))
        ));
    }

    #[test]
    fn test_parse_with_bom() {
        let value = parse_json_bytes(b"\xEF\xBB\xBF[1, 2]").unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_parse_keeps_number_text() {
        let value = parse_json_str(r#"{"x": 1e400, "id": 123456789012345678901234567890}"#).unwrap();
        assert_eq!(value["x"].to_string(), "1e400");
        assert_eq!(value["id"].to_string(), "123456789012345678901234567890");
    }
}

use crate::json_processor::batcher::{join_batch, BatchPlanner};
use crate::json_processor::collector::{collect_translatable, count_strings};
use crate::json_processor::reader::{get_file_size, JsonDocumentReader};
use crate::utils::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiktoken_rs::cl100k_base;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentMetadata {
    pub total_strings: usize,
    pub translatable_strings: usize,
    pub batch_size: usize,
    pub total_batches: usize,
    pub estimated_tokens: usize,
    pub file_size_bytes: Option<u64>,
    pub sample_entries: Vec<String>,
}

pub fn analyze_document(
    value: &Value,
    batch_size: usize,
    delimiter: &str,
    sample_size: usize,
) -> DocumentMetadata {
    let collected = collect_translatable(value);
    let planner = BatchPlanner::new(batch_size);

    DocumentMetadata {
        total_strings: count_strings(value),
        translatable_strings: collected.entry_count(),
        batch_size: planner.batch_size(),
        total_batches: planner.batch_count(collected.entry_count()),
        estimated_tokens: estimate_entry_tokens(&collected.entries, delimiter),
        file_size_bytes: None,
        sample_entries: collected.entries.into_iter().take(sample_size).collect(),
    }
}

pub async fn analyze_json_file(
    file_path: &str,
    batch_size: usize,
    delimiter: &str,
    sample_size: usize,
) -> Result<DocumentMetadata> {
    let value = JsonDocumentReader::new(file_path).read().await?;
    let mut metadata = analyze_document(&value, batch_size, delimiter, sample_size);
    metadata.file_size_bytes = Some(get_file_size(file_path).await?);
    Ok(metadata)
}

/// Prompt tokens for sending every entry once, with a 10% margin.
pub fn estimate_entry_tokens(entries: &[String], delimiter: &str) -> usize {
    if entries.is_empty() {
        return 0;
    }

    let joined = join_batch(entries, delimiter);
    let tokens = estimate_tokens(&joined);

    (tokens as f64 * 1.1) as usize
}

pub fn estimate_tokens(text: &str) -> usize {
    match cl100k_base() {
        Ok(bpe) => bpe.encode_with_special_tokens(text).len(),
        Err(_) => estimate_tokens_fallback(text),
    }
}

fn estimate_tokens_fallback(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

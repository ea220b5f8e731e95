pub mod analyzer;
pub mod batcher;
pub mod collector;
pub mod reader;
pub mod writer;

pub use analyzer::{analyze_document, analyze_json_file, estimate_tokens, DocumentMetadata};
pub use batcher::{join_batch, split_response, Batch, BatchPlanner, BatchRange};
pub use collector::{
    collect_translatable, contains_cjk, count_translatable, replace_translations,
    CollectedDocument,
};
pub use reader::{file_exists, parse_json_bytes, parse_json_str, JsonDocumentReader};
pub use writer::{to_pretty_string, JsonDocumentWriter};

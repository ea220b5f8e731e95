pub mod config;
pub mod errors;

pub use config::{
    AppConfig, ApiProvider, GlossaryTerm, TranslationSessionConfig, DEFAULT_BATCH_SIZE,
    DEFAULT_DELIMITER,
};
pub use errors::{JsonTranslatorError, Result};

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

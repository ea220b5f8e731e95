pub mod enums;
pub mod json_processor;
pub mod server;
pub mod state;
pub mod translation;
pub mod utils;

pub use enums::{extract_enums, render_enum_html, EnumTable};
pub use json_processor::{collect_translatable, replace_translations, DocumentMetadata};
pub use server::JsonTranslatorServer;
pub use state::{AppState, SessionState, SessionStatus};
pub use translation::{
    Translate, TranslationClient, TranslationPipeline, TranslationReport, TranslationSession,
};
pub use utils::{AppConfig, JsonTranslatorError, Result, TranslationSessionConfig};

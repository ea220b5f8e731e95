pub mod extractor;
pub mod html;

pub use extractor::{extract_enums, remove_duplicates, EnumEntry, EnumTable};
pub use html::{render_enum_html, render_table};

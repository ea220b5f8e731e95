use crate::enums::extractor::EnumTable;
use crate::utils::escape_html;

pub const SECTION_ID: &str = "api-enum-tables";
const SECTION_TITLE: &str = "枚举值";
const VALUE_HEADER: &str = "枚举值";
const DESCRIPTION_HEADER: &str = "说明";

/// Renders the enum section inserted into an API page, or `None` when there is nothing to show.
pub fn render_enum_html(tables: &[EnumTable]) -> Option<String> {
    if tables.is_empty() {
        return None;
    }

    let mut html = format!(
        "<h3 class=\"enum-section__title\">{}</h3>\n<div id=\"{}\" class=\"group-content\">\n",
        SECTION_TITLE, SECTION_ID
    );
    for table in tables {
        html.push_str(&render_table(table));
    }
    html.push_str("</div>\n");

    Some(html)
}

pub fn render_table(table: &EnumTable) -> String {
    let mut html = String::new();

    html.push_str("<div class=\"enum-card\">\n");
    html.push_str(&format!(
        "  <div class=\"enum-card__head\">{}</div>\n",
        escape_html(&table.name)
    ));
    html.push_str("  <div class=\"enum-card__body\">\n");
    html.push_str(&format!(
        "    <div class=\"enum-row enum-row--header\"><div class=\"enum-row__value\">{}</div><div class=\"enum-row__description\">{}</div></div>\n",
        VALUE_HEADER, DESCRIPTION_HEADER
    ));

    for entry in &table.entries {
        let value = escape_html(&entry.value);
        html.push_str(&format!(
            "    <div class=\"enum-row\" data-id=\"{}\"><div class=\"enum-row__value\">{}</div><div class=\"enum-row__description\"><p>{}</p></div></div>\n",
            value,
            value,
            escape_html(&entry.description)
        ));
    }

    html.push_str("  </div>\n</div>\n");
    html
}

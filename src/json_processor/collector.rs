//! Collect and replace passes over a JSON tree.
//!
//! Both passes visit leaves in the same pre-order: object members in stored
//! order, array elements by index. The replace pass relies on that to pair the
//! Nth translatable leaf with the Nth translation.

use crate::utils::{JsonTranslatorError, Result};
use serde_json::{Map, Value};

/// True when `text` has at least one CJK Unified Ideograph (U+4E00..=U+9FFF).
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedDocument {
    /// Structural copy of the input, untouched.
    pub skeleton: Value,
    /// Translatable leaf strings in traversal order.
    pub entries: Vec<String>,
}

impl CollectedDocument {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn collect_translatable(value: &Value) -> CollectedDocument {
    let mut entries = Vec::new();
    let skeleton = collect_into(value, &mut entries);
    CollectedDocument { skeleton, entries }
}

fn collect_into(value: &Value, entries: &mut Vec<String>) -> Value {
    match value {
        Value::Object(map) => {
            let mut copy = Map::with_capacity(map.len());
            for (key, child) in map {
                copy.insert(key.clone(), collect_into(child, entries));
            }
            Value::Object(copy)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| collect_into(item, entries))
                .collect(),
        ),
        Value::String(text) => {
            if contains_cjk(text) {
                entries.push(text.clone());
            }
            Value::String(text.clone())
        }
        Value::Number(_) | Value::Bool(_) | Value::Null => value.clone(),
    }
}

/// Counts translatable leaves without copying the tree.
pub fn count_translatable(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_translatable).sum(),
        Value::Array(items) => items.iter().map(count_translatable).sum(),
        Value::String(text) => usize::from(contains_cjk(text)),
        Value::Number(_) | Value::Bool(_) | Value::Null => 0,
    }
}

/// Counts every string leaf, translatable or not.
pub fn count_strings(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_strings).sum(),
        Value::Array(items) => items.iter().map(count_strings).sum(),
        Value::String(_) => 1,
        Value::Number(_) | Value::Bool(_) | Value::Null => 0,
    }
}

/// Substitutes translatable leaves of `skeleton` with `translations`, in order.
///
/// `translations` must hold exactly one entry per translatable leaf.
pub fn replace_translations(skeleton: Value, translations: &[String]) -> Result<Value> {
    let expected = count_translatable(&skeleton);
    if expected != translations.len() {
        return Err(JsonTranslatorError::TranslationCountMismatch {
            expected,
            got: translations.len(),
        });
    }

    let (value, consumed) = replace_at(skeleton, translations, 0);
    debug_assert_eq!(consumed, translations.len());
    Ok(value)
}

fn replace_at(value: Value, translations: &[String], cursor: usize) -> (Value, usize) {
    match value {
        Value::Object(map) => {
            let mut cursor = cursor;
            let mut replaced = Map::with_capacity(map.len());
            for (key, child) in map {
                let (child, next) = replace_at(child, translations, cursor);
                replaced.insert(key, child);
                cursor = next;
            }
            (Value::Object(replaced), cursor)
        }
        Value::Array(items) => {
            let mut cursor = cursor;
            let mut replaced = Vec::with_capacity(items.len());
            for item in items {
                let (item, next) = replace_at(item, translations, cursor);
                replaced.push(item);
                cursor = next;
            }
            (Value::Array(replaced), cursor)
        }
        Value::String(text) if contains_cjk(&text) => {
            (Value::String(translations[cursor].clone()), cursor + 1)
        }
        other => (other, cursor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("你好"));
        assert!(contains_cjk("id: 发票号码 (required)"));
        assert!(!contains_cjk("hello world"));
        assert!(!contains_cjk(""));
        // Hiragana and full-width punctuation sit outside the range.
        assert!(!contains_cjk("ひらがな，。"));
        assert!(contains_cjk("\u{4e00}"));
        assert!(contains_cjk("\u{9fff}"));
        assert!(!contains_cjk("\u{4dff}"));
        assert!(!contains_cjk("\u{a000}"));
    }

    #[test]
    fn test_collect_preorder() {
        let doc = json!({
            "title": "发票查询",
            "fields": [
                {"name": "invoiceNo", "desc": "发票号码"},
                {"name": "amount", "desc": "金额", "required": true}
            ],
            "footer": "end",
            "note": "备注"
        });

        let collected = collect_translatable(&doc);
        assert_eq!(collected.entries, vec!["发票查询", "发票号码", "金额", "备注"]);
        assert_eq!(collected.skeleton, doc);
    }

    #[test]
    fn test_collect_keeps_key_order() {
        let doc: Value = serde_json::from_str(r#"{"z": "甲", "a": "乙", "m": "丙"}"#).unwrap();
        let collected = collect_translatable(&doc);
        assert_eq!(collected.entries, vec!["甲", "乙", "丙"]);
    }

    #[test]
    fn test_collect_edge_values() {
        let doc = json!({"empty_obj": {}, "empty_arr": [], "empty_str": "", "n": 1.5, "b": false, "z": null});
        let collected = collect_translatable(&doc);
        assert!(collected.is_empty());
        assert_eq!(collected.skeleton, doc);
    }

    #[test]
    fn test_count_matches_collect_at_depth() {
        let doc = json!([[[["一"]]], {"a": {"b": {"c": ["二", "three", {"d": "四"}]}}}]);
        assert_eq!(count_translatable(&doc), 3);
        assert_eq!(collect_translatable(&doc).entry_count(), 3);
        assert_eq!(count_strings(&doc), 4);
    }

    #[test]
    fn test_replace_threads_cursor_across_subtrees() {
        let doc = json!({"a": ["一", {"b": "二"}], "c": "三", "d": "keep"});
        let collected = collect_translatable(&doc);
        let translations: Vec<String> = vec!["one".into(), "two".into(), "three".into()];

        let replaced = replace_translations(collected.skeleton, &translations).unwrap();
        assert_eq!(
            replaced,
            json!({"a": ["one", {"b": "two"}], "c": "three", "d": "keep"})
        );
    }

    #[test]
    fn test_replace_with_originals_is_identity() {
        let doc = json!({"a": "你好", "b": ["world", "再见"], "c": {"d": [1, "中文", null]}});
        let collected = collect_translatable(&doc);
        let replaced = replace_translations(collected.skeleton, &collected.entries).unwrap();
        assert_eq!(replaced, doc);
    }

    #[test]
    fn test_replace_rejects_wrong_length() {
        let doc = json!({"a": "你好", "b": "再见"});
        let result = replace_translations(doc, &["Hello".to_string()]);
        assert!(matches!(
            result,
            Err(JsonTranslatorError::TranslationCountMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_replace_scalar_root() {
        let replaced =
            replace_translations(json!("根"), &["root".to_string()]).unwrap();
        assert_eq!(replaced, json!("root"));
        assert_eq!(replace_translations(json!(42), &[]).unwrap(), json!(42));
    }
}

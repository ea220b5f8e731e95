use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

const UNKNOWN_NAME: &str = "Unknown Name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumEntry {
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumTable {
    pub name: String,
    pub entries: Vec<EnumEntry>,
}

/// Finds the enum tables used by one API of an exported documentation schema.
///
/// The schema is expected to carry `apiCollection` (tree of folders with `items`,
/// leaves holding `api`) and `schemaCollection` (shared models addressed by `$ref`).
pub fn extract_enums(schema: &Value, api_id: &str) -> Vec<EnumTable> {
    let Some(api) = schema
        .get("apiCollection")
        .and_then(Value::as_array)
        .and_then(|items| find_api(items, api_id))
    else {
        tracing::debug!(api_id = api_id, "API not found in schema");
        return Vec::new();
    };

    let mut walker = EnumWalker {
        schema_collection: schema
            .get("schemaCollection")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        followed_refs: HashSet::new(),
        tables: Vec::new(),
    };
    walker.walk(api);

    remove_duplicates(walker.tables)
}

fn find_api<'a>(items: &'a [Value], api_id: &str) -> Option<&'a Value> {
    for item in items {
        if let Some(api) = item.get("api") {
            if api.get("id").is_some_and(|id| id_matches(id, api_id)) {
                return Some(api);
            }
        }
        if let Some(children) = item.get("items").and_then(Value::as_array) {
            if let Some(found) = find_api(children, api_id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_schema_by_ref<'a>(items: &'a [Value], reference: &str) -> Option<&'a Value> {
    for item in items {
        if item.get("id").is_some_and(|id| ref_matches(id, reference)) {
            return Some(item);
        }
        if let Some(children) = item.get("items").and_then(Value::as_array) {
            if let Some(found) = find_schema_by_ref(children, reference) {
                return Some(found);
            }
        }
    }
    None
}

fn id_matches(id: &Value, expected: &str) -> bool {
    match id {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

/// `#/definitions/123` matches id `123`; a bare ref must match exactly.
fn ref_matches(id: &Value, reference: &str) -> bool {
    id_matches(id, reference)
        || reference
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment != reference && id_matches(id, segment))
}

struct EnumWalker<'a> {
    schema_collection: &'a [Value],
    followed_refs: HashSet<String>,
    tables: Vec<EnumTable>,
}

impl<'a> EnumWalker<'a> {
    fn walk(&mut self, value: &'a Value) {
        match value {
            Value::Object(map) => {
                if map.contains_key("enum") {
                    if let Some(table) = enum_table(value) {
                        self.tables.push(table);
                    }
                } else if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    self.follow_ref(reference);
                }

                for child in map.values() {
                    if child.is_object() || child.is_array() {
                        self.walk(child);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item);
                }
            }
            _ => {}
        }
    }

    fn follow_ref(&mut self, reference: &str) {
        if !self.followed_refs.insert(reference.to_string()) {
            return;
        }
        match find_schema_by_ref(self.schema_collection, reference) {
            Some(target) => self.walk(target),
            None => tracing::debug!(reference = reference, "Unresolved $ref"),
        }
    }
}

fn enum_table(object: &Value) -> Option<EnumTable> {
    let entries = if let Some(items) = object.get("x-apifox-enum").and_then(Value::as_array) {
        let mut entries: Vec<EnumEntry> = Vec::with_capacity(items.len());
        for item in items {
            let value = scalar_text(item.get("value"));
            let description = scalar_text(item.get("description"));
            // A repeated value keeps its first position and takes the last description.
            match entries.iter_mut().find(|entry| entry.value == value) {
                Some(entry) => entry.description = description,
                None => entries.push(EnumEntry { value, description }),
            }
        }
        entries
    } else if let Some(descriptions) = object
        .get("x-apifox")
        .and_then(|meta| meta.get("enumDescriptions"))
        .and_then(Value::as_object)
    {
        descriptions
            .iter()
            .map(|(value, description)| EnumEntry {
                value: value.clone(),
                description: scalar_text(Some(description)),
            })
            .collect()
    } else {
        return None;
    };

    Some(EnumTable {
        name: table_name(object),
        entries,
    })
}

fn table_name(object: &Value) -> String {
    ["title", "description"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .find(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Keeps the first of any tables with the same name and entries.
pub fn remove_duplicates(tables: Vec<EnumTable>) -> Vec<EnumTable> {
    let mut unique: Vec<EnumTable> = Vec::with_capacity(tables.len());
    for table in tables {
        if !unique.contains(&table) {
            unique.push(table);
        }
    }
    unique
}

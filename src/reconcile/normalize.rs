//! Glossary payload normalization
//!
//! Models send glossary entries in many shapes. Each logical field is
//! resolved through an ordered list of accepted spellings; the first key
//! holding a non-blank string wins.

use serde_json::Value;

/// Accepted spellings of the original term, highest priority first
pub const ORIGINAL_KEYS: &[&str] = &["original", "Original", "term", "source", "OriginalTerm"];

/// Accepted spellings of the translated term, highest priority first
pub const TRANSLATED_KEYS: &[&str] = &[
    "translated",
    "Translated",
    "translation",
    "target",
    "TargetTerm",
];

/// One entry of a payload after field resolution
///
/// A field is `None` when none of its spellings held a non-blank string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    /// Trimmed original term
    pub original: Option<String>,
    /// Trimmed translated term
    pub translated: Option<String>,
}

impl NormalizedEntry {
    /// Both terms, if the entry is complete
    pub fn complete(&self) -> Option<(&str, &str)> {
        Some((self.original.as_deref()?, self.translated.as_deref()?))
    }
}

/// Resolve a field through its spelling table
pub fn resolve_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Split a payload into its raw entries
///
/// Accepts an array of entries, an object with an `items` array, or a single
/// entry object. Anything else has no entries.
pub fn raw_entries(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![payload],
        },
        _ => Vec::new(),
    }
}

/// Normalize every entry of a payload, keeping payload order
pub fn normalize_payload(payload: &Value) -> Vec<NormalizedEntry> {
    raw_entries(payload)
        .into_iter()
        .map(|entry| NormalizedEntry {
            original: resolve_field(entry, ORIGINAL_KEYS),
            translated: resolve_field(entry, TRANSLATED_KEYS),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shapes() {
        let entry = json!({"original": "Hyung", "translated": "Kakak"});
        assert_eq!(normalize_payload(&json!([entry.clone()])).len(), 1);
        assert_eq!(normalize_payload(&json!({"items": [entry.clone(), entry.clone()]})).len(), 2);
        assert_eq!(normalize_payload(&entry).len(), 1);
        assert!(normalize_payload(&json!("Hyung")).is_empty());
        assert!(normalize_payload(&json!({"items": []})).is_empty());
    }

    #[test]
    fn test_alternate_spellings_and_priority() {
        let entries = normalize_payload(&json!([
            {"Original": " Hyung ", "TargetTerm": "Kakak"},
            {"term": "Noona", "translation": "Kakak perempuan"},
            {"original": "", "source": "Sunbae", "target": "Senior", "translated": "  "},
            {"original": "Oppa", "term": "ignored", "translated": "Abang"},
        ]));
        let pairs: Vec<(&str, &str)> = entries.iter().filter_map(|e| e.complete()).collect();
        assert_eq!(
            pairs,
            vec![
                ("Hyung", "Kakak"),
                ("Noona", "Kakak perempuan"),
                ("Sunbae", "Senior"),
                ("Oppa", "Abang"),
            ]
        );
    }

    #[test]
    fn test_missing_or_non_string_fields() {
        let entries = normalize_payload(&json!([
            {"original": "Hyung"},
            {"original": 7, "translated": "Tujuh"},
        ]));
        assert_eq!(entries[0].translated, None);
        assert_eq!(entries[1].original, None);
        assert!(entries.iter().all(|e| e.complete().is_none()));
    }
}

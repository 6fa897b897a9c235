use crate::providers::ResultItem;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

fn array_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("static regex"))
}

/// Narrows a model's text payload into result items.
///
/// Never fails: anything that is not a JSON array of `{id, translatedText}`
/// yields an empty list.
pub fn parse_result_items(content: &str) -> Vec<ResultItem> {
    match serde_json::from_str::<JsonValue>(content.trim()) {
        Ok(value) => items_from_value(value),
        Err(_) => {
            let Some(found) = array_pattern().find(content) else {
                return Vec::new();
            };
            match serde_json::from_str::<JsonValue>(found.as_str()) {
                Ok(value) => items_from_value(value),
                Err(_) => Vec::new(),
            }
        }
    }
}

fn items_from_value(value: JsonValue) -> Vec<ResultItem> {
    let JsonValue::Array(entries) = value else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let id = match entry.get("id")? {
                JsonValue::String(s) => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => b.to_string(),
                _ => return None,
            };
            if id.is_empty() {
                return None;
            }
            let translated_text = entry
                .get("translatedText")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string();
            Some(ResultItem { id, translated_text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_array() {
        let items = parse_result_items(r#"[{"id":"en:1","translatedText":"hello"}]"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "en:1");
        assert_eq!(items[0].translated_text, "hello");
    }

    #[test]
    fn extracts_array_from_fenced_reply() {
        let reply = "Sure! Here you go:\n```json\n[{\"id\": \"en:2\", \"translatedText\": \"bye\"}]\n```";
        let items = parse_result_items(reply);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].translated_text, "bye");
    }

    #[test]
    fn drops_entries_without_id() {
        let items = parse_result_items(
            r#"[{"translatedText":"x"},{"id":"","translatedText":"y"},{"id":"a","translatedText":"z"}]"#,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "a");
    }

    #[test]
    fn numeric_ids_are_stringified_and_bad_text_is_blank() {
        let items = parse_result_items(r#"[{"id":7,"translatedText":42}]"#);
        assert_eq!(items[0].id, "7");
        assert_eq!(items[0].translated_text, "");
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_result_items("I cannot help with that").is_empty());
        assert!(parse_result_items("[not json]").is_empty());
        assert!(parse_result_items(r#"{"id":"a","translatedText":"b"}"#).is_empty());
        assert!(parse_result_items("").is_empty());
    }
}

//! Best-effort parsing of list-shaped text produced by LLMs or stored by older clients.
//!
//! A bracketed list goes through an ordered chain of strategies. Each strategy is
//! total: it returns `None` instead of failing, and the first `Some` wins.
//!
//! 1. strict JSON
//! 2. single-quoted literals rewritten to double-quoted, then strict JSON
//! 3. every double-quoted substring, as a flat list of strings
//! 4. split on commas between the outer brackets

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+\-]*").expect("static regex"));
static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'((?:\\'|[^'])*)'").expect("static regex"));
static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:\\.|[^"])*)""#).expect("static regex"));
static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").expect("static regex"));
static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|-)\s*").expect("static regex"));
static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\r?\n)+").expect("static regex"));

type Strategy = fn(&str) -> Option<Vec<Value>>;

const BRACKETED_CHAIN: [Strategy; 4] = [strict_array, requoted_array, quoted_substrings, comma_split];

/// Removes a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = FENCE_OPEN.find(trimmed) else {
        return trimmed;
    };
    let body = &trimmed[open.end()..];
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses LLM output into a list of JSON values.
///
/// Returns `None` when the text is valid JSON but not an array, or when it is
/// neither JSON nor shaped like a bracketed list.
pub fn parse_loose_list(raw: &str) -> Option<Vec<Value>> {
    let text = strip_code_fence(raw);
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(items),
        Ok(_) => None,
        Err(_) => parse_bracketed_list(text),
    }
}

/// Runs the strategy chain on text that starts with `[` and ends with `]`.
pub fn parse_bracketed_list(raw: &str) -> Option<Vec<Value>> {
    let trimmed = raw.trim();
    if trimmed.len() < 2 || !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return None;
    }
    BRACKETED_CHAIN.iter().find_map(|strategy| strategy(trimmed))
}

fn strict_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn requoted_array(text: &str) -> Option<Vec<Value>> {
    let requoted = requote_single_quotes(text);
    if requoted == text {
        return None;
    }
    strict_array(&requoted)
}

fn quoted_substrings(text: &str) -> Option<Vec<Value>> {
    let requoted = requote_single_quotes(text);
    let items: Vec<Value> = DOUBLE_QUOTED
        .captures_iter(&requoted)
        .map(|caps| unescape_quotes(&caps[1]).trim().to_string())
        .filter(|s| !s.is_empty())
        .map(Value::String)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn comma_split(text: &str) -> Option<Vec<Value>> {
    let inner = &text[1..text.len() - 1];
    let items = COMMA
        .split(inner)
        .map(|entry| {
            let entry = entry.strip_prefix(['\'', '"']).unwrap_or(entry);
            let entry = entry.strip_suffix(['\'', '"']).unwrap_or(entry);
            unescape_quotes(entry).trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .map(Value::String)
        .collect();
    Some(items)
}

/// Rewrites `'literal'` as a JSON string literal, escaping its backslashes and quotes.
fn requote_single_quotes(text: &str) -> String {
    SINGLE_QUOTED
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let inner = caps[1].replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{inner}\"")
        })
        .into_owned()
}

fn unescape_quotes(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\'", "'")
}

/// Strips a leading ordinal marker (`1.`, `2)`, `-`) and surrounding whitespace,
/// dropping entries that are empty or not strings.
pub fn clean_instruction_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(|step| ORDINAL.replace(step, "").trim().to_string())
        .filter(|step| !step.is_empty())
        .collect()
}

/// Normalizes stored or generated instructions into clean step strings.
///
/// Accepts an array of steps, a serialized list, or newline-separated text.
pub fn normalize_instructions(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => clean_instruction_list(items),
        Value::String(text) => match parse_bracketed_list(text) {
            Some(items) if !items.is_empty() => clean_instruction_list(&items),
            _ => {
                let lines: Vec<Value> = LINE_BREAKS
                    .split(text)
                    .map(|line| Value::String(line.to_string()))
                    .collect();
                clean_instruction_list(&lines)
            }
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```JSON [1]```"), "[1]");
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
    }

    #[test]
    fn test_strict_json_wins() {
        let items = parse_loose_list(r#"[{"name": "Soup"}]"#).unwrap();
        assert_eq!(items, vec![json!({"name": "Soup"})]);
    }

    #[test]
    fn test_non_array_json_is_not_a_list() {
        assert_eq!(parse_loose_list(r#"{"name": "Soup"}"#), None);
        assert_eq!(parse_loose_list("I could not make any recipes."), None);
    }

    #[test]
    fn test_single_quoted_python_list_is_repaired() {
        let items = parse_loose_list("['chop the onion', 'say \"hi\"']").unwrap();
        assert_eq!(items, vec![json!("chop the onion"), json!("say \"hi\"")]);
    }

    #[test]
    fn test_single_quoted_objects_are_repaired() {
        let items = parse_loose_list("[{'name': 'Toast', 'steps': ['toast it']}]").unwrap();
        assert_eq!(items, vec![json!({"name": "Toast", "steps": ["toast it"]})]);
    }

    #[test]
    fn test_falls_back_to_quoted_substrings() {
        let items = parse_bracketed_list(r#"["boil water", "add pasta", oops]"#).unwrap();
        assert_eq!(items, vec![json!("boil water"), json!("add pasta")]);
    }

    #[test]
    fn test_falls_back_to_comma_split() {
        let items = parse_bracketed_list("[salt, pepper , olive oil,]").unwrap();
        assert_eq!(items, vec![json!("salt"), json!("pepper"), json!("olive oil")]);
    }

    #[test]
    fn test_unbracketed_text_is_rejected_by_chain() {
        assert_eq!(parse_bracketed_list("salt, pepper"), None);
    }

    #[test]
    fn test_clean_instruction_list_strips_ordinals() {
        let steps = clean_instruction_list(&[
            json!("1. Heat oil"),
            json!("  2) Add garlic "),
            json!("- Stir"),
            json!("10. Serve"),
            json!(""),
            json!(42),
        ]);
        assert_eq!(steps, vec!["Heat oil", "Add garlic", "Stir", "Serve"]);
    }

    #[test]
    fn test_normalize_instructions_from_serialized_list() {
        let steps = normalize_instructions(&json!("['preheat oven', 'bake 20 minutes']"));
        assert_eq!(steps, vec!["preheat oven", "bake 20 minutes"]);
    }

    #[test]
    fn test_normalize_instructions_from_lines() {
        let steps = normalize_instructions(&json!("1. Mix\r\n\r\n2. Bake\n"));
        assert_eq!(steps, vec!["Mix", "Bake"]);
    }

    #[test]
    fn test_normalize_instructions_other_types() {
        assert!(normalize_instructions(&Value::Null).is_empty());
        assert!(normalize_instructions(&json!({"step": 1})).is_empty());
    }
}

//! JSON extraction from free-form generator text
//!
//! Generators wrap JSON in markdown fences, add preamble, or truncate large
//! objects at the output budget. Extraction runs a four-rung ladder:
//! 1. direct parse
//! 2. fenced code block
//! 3. largest brace-delimited substring
//! 4. structural repair of a truncated object

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex"));

// Matches an unterminated fence as well, for truncation repair
static FENCED_OR_OPEN_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)(?:```|$)").expect("open fence regex"));

// Trailing incomplete key-value pair left by truncation
static TRAILING_PARTIAL_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#",\s*"[^"]*"?\s*:?\s*[^}\]]*$"#).expect("partial pair regex"));

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*$").expect("comma regex"));

/// Extract a JSON value from generator text.
///
/// Tries the first three ladder rungs; truncation repair is separate
/// ([`repair_truncated`]) so callers can log when it was needed.
#[must_use]
pub fn parse_structured(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(capture) = FENCED_BLOCK.captures(text) {
        if let Ok(value) = serde_json::from_str(capture[1].trim()) {
            return Some(value);
        }
    }

    // Largest brace-delimited substring: first '{' to last '}'
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&text[start..=end]) {
                return Some(value);
            }
        }
    }

    None
}

/// Open delimiters outside string literals, in nesting order, plus whether
/// the text ends inside a string
fn unclosed_delimiters(json: &str) -> (Vec<char>, bool) {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in json.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }
    (stack, in_string)
}

/// Attempt to repair a truncated JSON object.
///
/// Trims a trailing incomplete key-value pair, counts unmatched `{`/`[`
/// delimiters outside string literals, and appends the missing closers in
/// nesting order. Returns `None` when the text is balanced (just invalid)
/// or still unparseable after repair.
#[must_use]
pub fn repair_truncated(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }

    let mut json = text.trim().to_string();
    if let Some(capture) = FENCED_OR_OPEN_BLOCK.captures(&json) {
        json = capture[1].trim().to_string();
    }
    let start = json.find('{')?;
    json = json[start..].to_string();

    let (stack, _) = unclosed_delimiters(&json);
    if stack.is_empty() {
        // Balanced delimiters: not truncated, just invalid
        return None;
    }

    // Drop the trailing incomplete key-value pair, then dangling commas
    json = TRAILING_PARTIAL_PAIR.replace(&json, "").into_owned();
    json = TRAILING_COMMA.replace(&json, "").into_owned();

    // Recount after trimming; the trim may have removed open delimiters
    let (stack, in_string) = unclosed_delimiters(&json);
    if in_string {
        json.push('"');
    }
    for open in stack.iter().rev() {
        json.push(if *open == '{' { '}' } else { ']' });
    }

    serde_json::from_str(&json).ok()
}

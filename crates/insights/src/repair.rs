//! Lenient JSON parsing for model output.
//!
//! Models wrap JSON in code fences, add prose around it, leave trailing
//! commas or stop mid-value when they hit a token limit. Repair stays narrow:
//! strip a fence, take the first balanced value, drop trailing commas and
//! any key left without a value, close an open string and open brackets, then
//! re-parse. Anything still
//! invalid is a [`ProviderError::InvalidResponse`].

use crate::error::ProviderError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[\w-]*[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("Invalid regex pattern")
});

const PREVIEW_CHARS: usize = 200;

/// Parse a model response into JSON, repairing common defects.
pub fn parse_json_response(raw: &str) -> Result<Value, ProviderError> {
    let body = strip_code_fence(raw.trim());
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    let candidate = first_value(body).ok_or_else(|| {
        ProviderError::InvalidResponse(format!("no JSON value in response: {}", preview(raw)))
    })?;
    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Ok(value);
    }

    let repaired = repair(candidate);
    log::debug!("Repaired model JSON ({} -> {} bytes)", candidate.len(), repaired.len());
    serde_json::from_str(&repaired).map_err(|e| {
        ProviderError::InvalidResponse(format!("{e}; response: {}", preview(raw)))
    })
}

fn strip_code_fence(text: &str) -> &str {
    if let Some(inner) = CODE_FENCE.captures(text).and_then(|caps| caps.get(1)) {
        return inner.as_str().trim();
    }
    // Opening fence without a closing one: output was cut off.
    if text.starts_with("```") {
        return text
            .split_once('\n')
            .map_or("", |(_, rest)| rest.trim());
    }
    text
}

/// First balanced object or array, or the unterminated tail starting at the
/// first opening bracket.
fn first_value(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Some(&text[start..])
}

fn repair(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len() + 8);
    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut string_start = 0;

    for ch in candidate.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                string_start = out.len();
                out.push(ch);
            }
            '{' => {
                closers.push('}');
                out.push(ch);
            }
            '[' => {
                closers.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                if closers.last() == Some(&ch) {
                    closers.pop();
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    drop_trailing_comma(&mut out);
    // A key cut off before its value is dropped, never given one.
    if out.trim_end().ends_with(':') {
        out.truncate(string_start);
        drop_trailing_comma(&mut out);
    }
    while let Some(close) = closers.pop() {
        drop_trailing_comma(&mut out);
        out.push(close);
    }
    out
}

fn drop_trailing_comma(out: &mut String) {
    let len = out.trim_end().len();
    if out[..len].ends_with(',') {
        out.truncate(len - 1);
    }
}

fn preview(raw: &str) -> String {
    let mut preview: String = raw.chars().take(PREVIEW_CHARS).collect();
    if raw.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn plain_json_passes_through() {
        assert_eq!(parse_json_response(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parse_json_response(" null ").unwrap(), Value::Null);
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "Here you go:\n```json\n{\"functions\": []}\n```\nAnything else?";
        assert_eq!(parse_json_response(raw).unwrap(), json!({"functions": []}));
    }

    #[test]
    fn prose_around_the_object_is_ignored() {
        let raw = r#"Sure! {"imports": [{"source": "./y"}]} Hope that helps {"not": "this"}"#;
        assert_eq!(
            parse_json_response(raw).unwrap(),
            json!({"imports": [{"source": "./y"}]})
        );
    }

    #[test]
    fn braces_inside_strings_do_not_count() {
        let raw = r#"{"name": "a}b{", "escaped": "quote \" }"} trailing"#;
        assert_eq!(
            parse_json_response(raw).unwrap(),
            json!({"name": "a}b{", "escaped": "quote \" }"})
        );
    }

    #[test]
    fn trailing_commas_are_dropped() {
        let raw = r#"{"classes": [{"name": "A"},], "imports": [],}"#;
        assert_eq!(
            parse_json_response(raw).unwrap(),
            json!({"classes": [{"name": "A"}], "imports": []})
        );
    }

    #[test]
    fn truncated_output_is_closed() {
        let raw = r#"{"functions":[{"name":"add","parameters":["a","b"#;
        assert_eq!(
            parse_json_response(raw).unwrap(),
            json!({"functions": [{"name": "add", "parameters": ["a", "b"]}]})
        );
    }

    #[test]
    fn truncated_fence_is_tolerated() {
        let raw = "```json\n{\"classes\": [{\"name\": \"A\"}";
        assert_eq!(
            parse_json_response(raw).unwrap(),
            json!({"classes": [{"name": "A"}]})
        );
    }

    #[test]
    fn dangling_key_is_dropped() {
        let raw = r#"{"a": 1, "b":"#;
        assert_eq!(parse_json_response(raw).unwrap(), json!({"a": 1}));

        let nested = r#"{"imports": [{"source": "./y", "names": "#;
        assert_eq!(
            parse_json_response(nested).unwrap(),
            json!({"imports": [{"source": "./y"}]})
        );

        assert_eq!(parse_json_response(r#"{"only": "#).unwrap(), json!({}));
    }

    #[test]
    fn unrecoverable_output_is_invalid_response() {
        assert!(matches!(
            parse_json_response("I cannot help with that."),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_json_response(r#"{"a" 1 2}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}

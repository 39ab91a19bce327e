//! Normalization of raw LLM output into a bare locator string.
//!
//! Models wrap answers in markdown fences, quotes, JSON objects or
//! `locator:` phrasing regardless of prompt instructions. `clean` strips
//! all of those in a fixed order and degrades to returning its input when
//! nothing matches.

/// Extract a bare locator from a raw model response. Total; never fails.
pub fn clean(raw: &str) -> String {
    let mut cleaned = raw.trim().to_string();

    // Markdown code fence, with optional language tag on the opening line
    if cleaned.starts_with("```") {
        let mut lines: Vec<&str> = cleaned.lines().collect();
        lines.remove(0);
        if lines.last().map(|l| l.trim().starts_with("```")).unwrap_or(false) {
            lines.pop();
        }
        cleaned = lines.join("\n").trim().to_string();
    }

    cleaned = cleaned.trim_matches('`').to_string();
    cleaned = strip_quotes(&cleaned);

    // JSON object responses like {"locator": "#submit"}; the extracted
    // value keeps flowing through the remaining steps
    if cleaned.starts_with('{') {
        match serde_json::from_str::<serde_json::Value>(&cleaned) {
            Ok(value) => {
                if let Some(locator) = value.get("locator").and_then(|v| v.as_str()) {
                    cleaned = locator.trim().to_string();
                }
            }
            Err(_) => {
                if let Some(locator) = extract_locator_field(&cleaned) {
                    cleaned = locator;
                } else if let Some(first) = first_quoted_string(&cleaned) {
                    cleaned = first;
                }
            }
        }
    }

    // "The best locator: #submit" style answers, prefix or mid-string
    if cleaned.to_lowercase().contains("locator:") {
        if let Some((_, rest)) = cleaned.split_once(':') {
            cleaned = strip_quotes(rest.trim());
        }
    }

    // Multi-line answers keep only the first line
    cleaned = cleaned.lines().next().unwrap_or("").trim().to_string();

    cleaned
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches('"').trim_matches('\'').to_string()
}

/// Scan for a `"locator": "..."` field in malformed JSON
fn extract_locator_field(text: &str) -> Option<String> {
    let key_pos = text.find("\"locator\"")?;
    let after_key = &text[key_pos + "\"locator\"".len()..];
    let colon_pos = after_key.find(':')?;
    first_quoted_string(&after_key[colon_pos + 1..])
}

/// First double-quoted substring, if any
fn first_quoted_string(text: &str) -> Option<String> {
    let start = text.find('"')?;
    let rest = &text[start + 1..];
    let end = rest.find('"')?;
    if end == 0 {
        return None;
    }
    Some(rest[..end].to_string())
}

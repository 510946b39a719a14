//! Decision-text extractor: structured decisions from unreliable text.
//!
//! The model is asked for a small JSON object but routinely wraps it in
//! commentary or a fenced code block, drops keys, or emits bare words
//! where strings belong. The extractor therefore never parses the text
//! properly: it slices from the first `{` to the last `}` and pulls the
//! four named fields out independently with the same bounded-scan
//! primitive the wire codec uses. Missing keys map to absent values and
//! a literal `null` (any case) maps to an absent value, not the
//! four-character string.
//!
//! The result is valid iff the extracted `action` is non-empty after
//! trimming; otherwise the whole extraction fails.

use reverie_types::Decision;

use crate::codec;
use crate::error::LlmError;

/// Extract a [`Decision`] from raw generated text.
///
/// # Errors
///
/// Returns [`LlmError::Extraction`] when no `{`..`}` span exists or when
/// the payload names no action.
pub fn extract_decision(raw: &str) -> Result<Decision, LlmError> {
    if raw.trim().is_empty() {
        return Err(LlmError::Extraction("empty response".to_owned()));
    }

    let start = raw.find('{');
    let end = raw.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(LlmError::Extraction("no structured payload found".to_owned()));
    };
    if end <= start {
        return Err(LlmError::Extraction("no structured payload found".to_owned()));
    }
    let Some(json) = raw.get(start..=end) else {
        return Err(LlmError::Extraction("no structured payload found".to_owned()));
    };

    let thought = extract_field(json, "thought");
    let action = extract_field(json, "action");
    let target = extract_field(json, "target");
    let speech = extract_field(json, "speech");

    let action_name = action
        .map(|a| a.trim().to_owned())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| LlmError::Extraction("decision names no action".to_owned()))?;

    Ok(Decision {
        reasoning: thought.unwrap_or_default(),
        action_name,
        target,
        spoken_line: speech,
    })
}

/// Pull one named field out of a JSON-like span.
///
/// Locates `"key"` case-insensitively, skips past the colon and
/// whitespace, then copies either a quoted string (unescaped) or, for an
/// unquoted value, everything up to the next `,`, `}`, or `]`.
fn extract_field(json: &str, key: &str) -> Option<String> {
    let pattern = format!("\"{key}\"");
    // ASCII lowercasing preserves byte offsets, so positions found in the
    // lowered copy index straight into the original.
    let lowered = json.to_ascii_lowercase();
    let key_at = lowered.find(&pattern)?;

    let bytes = json.as_bytes();
    let after_key = key_at.checked_add(pattern.len())?;
    let mut i = after_key;
    loop {
        match bytes.get(i) {
            Some(b':') => break,
            Some(_) => i = i.checked_add(1)?,
            None => return None,
        }
    }
    i = i.checked_add(1)?;
    while matches!(bytes.get(i), Some(b) if b.is_ascii_whitespace()) {
        i = i.checked_add(1)?;
    }

    // Literal null means "absent", in any casing.
    if let Some(ahead) = i.checked_add(4).and_then(|to| bytes.get(i..to))
        && ahead.eq_ignore_ascii_case(b"null")
    {
        return None;
    }

    match bytes.get(i) {
        Some(b'"') => copy_quoted(bytes, i.checked_add(1)?),
        Some(_) => copy_bare(json, bytes, i),
        None => None,
    }
}

/// Copy a quoted value starting just past its opening quote.
fn copy_quoted(bytes: &[u8], from: usize) -> Option<String> {
    let mut i = from;
    let mut escaped = false;
    loop {
        let Some(&b) = bytes.get(i) else { break };
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            break;
        }
        i = i.checked_add(1)?;
    }
    let raw = std::str::from_utf8(bytes.get(from..i)?).ok()?;
    Some(codec::unescape(raw))
}

/// Copy an unquoted value (bare word or number) up to the next delimiter.
fn copy_bare(json: &str, bytes: &[u8], from: usize) -> Option<String> {
    let mut i = from;
    while let Some(&b) = bytes.get(i) {
        if b == b',' || b == b'}' || b == b']' {
            break;
        }
        i = i.checked_add(1)?;
    }
    let value = json.get(from..i)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

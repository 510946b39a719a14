//! Minimal hand-assembled wire codec for provider request/response bodies.
//!
//! Requests are built with `format!` rather than a general-purpose
//! serializer, and responses are scanned with bounded string searches
//! rather than a parse tree. The response shapes are simple and mostly
//! flat, so the codec looks for a known key marker (last occurrence for
//! chat-completions shapes, first occurrence for the distinct-schema
//! provider), skips to the value's opening quote, and copies characters
//! until an unescaped closing quote, tracking escape state with a single
//! boolean flag.
//!
//! This is a deliberate brittleness/simplicity tradeoff: the scan breaks
//! if a `"content"` substring appears in metadata with higher textual
//! precedence than the real payload. That contract (last-key-wins, no
//! schema validation) is load-bearing for compatibility with several
//! loosely-specified response shapes and must not be "fixed" with a full
//! JSON parser.
//!
//! Every extraction function is total: a malformed or marker-absent body
//! yields `None`, never a panic or a partial value.

/// Escape a string for embedding inside a JSON string literal.
///
/// Handles exactly the set the providers care about: backslash, double
/// quote, newline, carriage return, and tab.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape`].
///
/// A single left-to-right scan, so `\\n` correctly becomes a literal
/// backslash followed by `n` rather than a newline. Unknown escape pairs
/// and a trailing lone backslash are passed through unchanged.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Build an OpenAI-compatible chat-completions request body.
///
/// `{model, messages:[system, user], max_tokens, temperature}`.
pub fn chat_completions_body(model: &str, system: &str, user: &str, max_tokens: u32) -> String {
    format!(
        "{{\"model\":\"{}\",\"messages\":[\
         {{\"role\":\"system\",\"content\":\"{}\"}},\
         {{\"role\":\"user\",\"content\":\"{}\"}}],\
         \"max_tokens\":{max_tokens},\"temperature\":0.7}}",
        escape(model),
        escape(system),
        escape(user),
    )
}

/// Build a request body for the distinct-schema (Anthropic-style) provider.
///
/// The system prompt is a top-level field outside `messages`, the token
/// cap is required, and there is no temperature field.
pub fn messages_body(model: &str, system: &str, user: &str, max_tokens: u32) -> String {
    format!(
        "{{\"model\":\"{}\",\"max_tokens\":{max_tokens},\"system\":\"{}\",\
         \"messages\":[{{\"role\":\"user\",\"content\":\"{}\"}}]}}",
        escape(model),
        escape(system),
        escape(user),
    )
}

/// Build a request body for a local-inference chat endpoint.
///
/// Shaped like the chat-completions body but without a token cap and with
/// `stream:false` so the whole response arrives in one exchange.
pub fn local_chat_body(model: &str, system: &str, user: &str) -> String {
    format!(
        "{{\"model\":\"{}\",\"messages\":[\
         {{\"role\":\"system\",\"content\":\"{}\"}},\
         {{\"role\":\"user\",\"content\":\"{}\"}}],\
         \"stream\":false}}",
        escape(model),
        escape(system),
        escape(user),
    )
}

/// Extract the string value following the **last** occurrence of `marker`.
///
/// Used for chat-completions shapes where the payload `"content":` comes
/// after any echoed request metadata.
pub fn string_after_last(body: &str, marker: &str) -> Option<String> {
    let at = body.rfind(marker)?;
    copy_string_value(body, at.checked_add(marker.len())?)
}

/// Extract the string value following the **first** occurrence of `marker`.
///
/// Used for the distinct-schema provider, whose payload `"text":` is the
/// first text block in the response.
pub fn string_after_first(body: &str, marker: &str) -> Option<String> {
    let at = body.find(marker)?;
    copy_string_value(body, at.checked_add(marker.len())?)
}

/// Extract the unsigned integer following the first occurrence of `marker`.
///
/// Scans forward through optional whitespace, then through contiguous
/// digit characters. Used for token-usage counters.
pub fn number_after(body: &str, marker: &str) -> Option<u32> {
    let bytes = body.as_bytes();
    let mut i = body.find(marker)?.checked_add(marker.len())?;
    while matches!(bytes.get(i), Some(b) if b.is_ascii_whitespace()) {
        i = i.checked_add(1)?;
    }
    let start = i;
    while matches!(bytes.get(i), Some(b) if b.is_ascii_digit()) {
        i = i.checked_add(1)?;
    }
    if i == start {
        return None;
    }
    std::str::from_utf8(bytes.get(start..i)?).ok()?.parse().ok()
}

/// Copy the string value starting at byte offset `from` in `body`.
///
/// Skips spaces and the opening quote, then copies until an unescaped
/// closing quote. A backslash toggles "next character is literal".
fn copy_string_value(body: &str, from: usize) -> Option<String> {
    let bytes = body.as_bytes();
    let mut i = from;

    // Skip whitespace and the opening quote, as the original scanner does.
    while matches!(bytes.get(i), Some(b' ' | b'"')) {
        i = i.checked_add(1)?;
    }

    let start = i;
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

    // A quote byte cannot occur inside a multi-byte UTF-8 sequence, so
    // this slice is always on a char boundary.
    let raw = std::str::from_utf8(bytes.get(start..i)?).ok()?;
    Some(unescape(raw))
}

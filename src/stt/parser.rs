//! Parsing of the external process's output lines.
//!
//! The whisper filter emits one JSON-ish line per recognized utterance,
//! interleaved with arbitrary diagnostic chatter. Lines are gated by a
//! cheap structural filter, then the `text` field is extracted with a
//! strict JSON parse where possible and a tolerant scan otherwise — the
//! filter's output is not guaranteed to be valid JSON (single-quoted
//! values have been observed in the field).

use std::time::Instant;

/// A recognized utterance and when it was observed.
#[derive(Debug, Clone)]
pub struct TranscriptionEvent {
    pub text: String,
    pub observed_at: Instant,
}

impl TranscriptionEvent {
    pub fn now(text: String) -> Self {
        Self {
            text,
            observed_at: Instant::now(),
        }
    }
}

/// Extracts utterance text from raw output lines and drops noise.
pub struct OutputParser {
    /// Lowercased non-speech descriptors; utterances containing any of
    /// them are the transcriber's rendering of background noise.
    denylist: Vec<String>,
}

impl OutputParser {
    pub fn new(denylist: &[String]) -> Self {
        Self {
            denylist: denylist.iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    /// Parse one raw line. Returns clean utterance text, or `None` for
    /// diagnostic chatter, malformed lines, empty text, and denylisted
    /// noise descriptions. Never fails: the stream contains non-JSON
    /// lines by design.
    pub fn parse(&self, raw_line: &str) -> Option<String> {
        let text = extract_text(raw_line)?;
        if text.is_empty() || self.is_noise(&text) {
            return None;
        }
        Some(text)
    }

    fn is_noise(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.denylist.iter().any(|word| lower.contains(word))
    }
}

/// Extract the `text` field value from a candidate line.
///
/// A line is only a candidate if, after trimming, it is bracketed by
/// `{`…`}`. Everything else is the external process's status output.
fn extract_text(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }

    // Strict parse first — the common case is well-formed JSON
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
        && let Some(text) = value.get("text").and_then(|t| t.as_str())
    {
        return Some(text.trim().to_string());
    }

    scan_text_field(trimmed)
}

/// Tolerant fallback: find a `text` key in either quote style and read a
/// value quoted with either style. The value ends at the first quote
/// character of any kind, as in `"text"\s*:\s*["']([^"']*)["']`.
fn scan_text_field(line: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let key = format!("{quote}text{quote}");
        let Some(key_pos) = line.find(&key) else {
            continue;
        };
        let after_key = line[key_pos + key.len()..].trim_start();
        let Some(after_colon) = after_key.strip_prefix(':') else {
            continue;
        };
        let after_colon = after_colon.trim_start();
        let mut chars = after_colon.chars();
        let Some(open) = chars.next() else { continue };
        if open != '"' && open != '\'' {
            continue;
        }
        let rest = &after_colon[open.len_utf8()..];
        let end = rest.find(['"', '\''])?;
        return Some(rest[..end].trim().to_string());
    }
    None
}

//! Input cleaning for text that ends up inside agent instructions.
//!
//! Event fields are interpolated into natural-language prompts, so delimiter
//! and chat-template markers are neutralised before use.

use url::Url;

const INSTRUCTION_MARKERS: &[&str] = &[
    "[inst]",
    "[/inst]",
    "<|im_start|>",
    "<|im_end|>",
    "<|system|>",
    "<|user|>",
    "<|assistant|>",
];

/// Clean free text and truncate it to `max_len` characters.
pub fn sanitize_input(text: &str, max_len: usize) -> String {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    cleaned = cleaned.replace("```", "'''").replace("---", "___");

    for marker in INSTRUCTION_MARKERS {
        cleaned = remove_ignore_case(&cleaned, marker);
    }

    cleaned.chars().take(max_len).collect()
}

// Char-wise so multi-byte text around a marker stays intact.
fn remove_ignore_case(text: &str, marker: &str) -> String {
    let marker_len = marker.chars().count();
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let matches = i + marker_len <= chars.len()
            && chars[i..i + marker_len]
                .iter()
                .zip(marker.chars())
                .all(|(a, b)| a.to_ascii_lowercase() == b);
        if matches {
            i += marker_len;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Keep only well-formed `http`/`https` URLs with a host; anything else becomes empty.
pub fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            trimmed.to_string()
        }
        _ => String::new(),
    }
}

//! Text cleanup for renderer captions and scraped posts.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|quot|apos|amp|lt|gt|nbsp);")
        .expect("hardcoded entity regex")
});

static QUOTELINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*class="[^"]*\bquotelink\b[^"]*"[^>]*>.*?</a>"#)
        .expect("hardcoded quotelink regex")
});

static BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("hardcoded break regex"));

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("hardcoded tag regex"));

/// Runs of real or escaped newlines, with the spaces around them.
static NEWLINE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *(?:\n+|(?:\\n)+) *").expect("hardcoded newline regex"));

static SPACE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("hardcoded space regex"));

/// Decode the HTML entities chat clients and imageboards emit.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |captures: &Captures| {
            let entity = &captures[1];
            let decoded = match entity {
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "nbsp" => Some(' '),
                _ => {
                    let code = if let Some(hex) = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity[1..].parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

/// Prepare user text for the renderer's `--words` template.
///
/// `;` separates template segments, so it is stripped from user input.
pub fn clean_caption(text: &str) -> String {
    decode_entities(text).replace(';', "")
}

/// Collapse spaces around line breaks and runs of spaces, then trim.
pub fn clean_lines(text: &str) -> String {
    let text = NEWLINE_RUN_REGEX.replace_all(text, "\n");
    let text = SPACE_RUN_REGEX.replace_all(&text, " ");
    text.trim().to_string()
}

/// Turn an imageboard comment body into plain text.
pub fn post_to_text(html: &str) -> String {
    let text = QUOTELINK_REGEX.replace_all(html, "");
    let text = BREAK_REGEX.replace_all(&text, "\n");
    let text = TAG_REGEX.replace_all(&text, "");
    clean_lines(&decode_entities(&text))
}

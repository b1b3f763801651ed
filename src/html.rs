//! Small HTML text helpers shared by the head and structured-data parsers.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);")
        .expect("Failed to compile entity regex - this is a bug")
});

static SCRIPT_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^<script[^>]*>").expect("Failed to compile script open regex - this is a bug")
});

static SCRIPT_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</script\s*>$").expect("Failed to compile script close regex - this is a bug")
});

/// Decodes the character references SEO plugins emit in attribute values and
/// inline JSON.
///
/// Decoding is a single pass, so `&amp;lt;` becomes `&lt;`, not `<`.
/// Unknown named references are kept verbatim.
pub fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    ENTITY_RE
        .replace_all(value, |caps: &Captures| {
            decode_reference(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_reference(reference: &str) -> Option<String> {
    if let Some(num) = reference.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match reference {
        "quot" => "\"",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Removes a surrounding `<script ...>` / `</script>` envelope, if any, and
/// trims whitespace. Either tag may be missing.
pub fn strip_script_wrapper(value: &str) -> String {
    let trimmed = value.trim();
    let opened = SCRIPT_OPEN_RE.replace(trimmed, "");
    let closed = SCRIPT_CLOSE_RE.replace(&opened, "");
    closed.trim().to_string()
}

//! `<meta>` extraction from the SEO plugin's raw `fullHead` markup.
//!
//! The input is a narrow, machine-generated fragment, so a pair of regexes is
//! enough. Anything that doesn't match is ignored; malformed markup yields
//! fewer entries, never an error.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::html::decode_entities;

/// Meta key (`property` or `name`) to decoded `content`.
pub type HeadMetaMap = BTreeMap<String, String>;

static META_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<meta\b[^>]*?>").expect("Failed to compile meta tag regex - this is a bug")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([:@a-zA-Z0-9_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("Failed to compile attribute regex - this is a bug")
});

/// Parses every `<meta>` tag in `full_head` into a key/content map.
///
/// The key is the tag's `property` attribute, else its `name`. Tags without
/// either, or with an empty `content`, are skipped. When a key repeats, the
/// last tag wins.
pub fn parse_head_meta(full_head: &str) -> HeadMetaMap {
    let mut map = HeadMetaMap::new();

    for tag in META_TAG_RE.find_iter(full_head) {
        let mut attrs: BTreeMap<String, &str> = BTreeMap::new();
        for caps in ATTR_RE.captures_iter(tag.as_str()) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            attrs.insert(caps[1].to_ascii_lowercase(), value);
        }

        let key = attrs
            .get("property")
            .filter(|v| !v.is_empty())
            .or_else(|| attrs.get("name").filter(|v| !v.is_empty()));
        let content = attrs.get("content").filter(|v| !v.is_empty());

        if let (Some(key), Some(content)) = (key, content) {
            map.insert(key.to_string(), decode_entities(content));
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_og_title_decoded() {
        let map = parse_head_meta(r#"<meta property="og:title" content="Hello &amp; World">"#);
        assert_eq!(map.len(), 1);
        assert_eq!(map["og:title"], "Hello & World");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_head_meta("").is_empty());
        assert!(parse_head_meta("<title>No meta here</title>").is_empty());
    }

    #[test]
    fn test_name_fallback_and_quotes() {
        let head = r#"
            <meta name="description" content='It&#39;s a &quot;test&quot;' />
            <META NAME="twitter:card" CONTENT="summary_large_image">
        "#;
        let map = parse_head_meta(head);
        assert_eq!(map["description"], "It's a \"test\"");
        assert_eq!(map["twitter:card"], "summary_large_image");
    }

    #[test]
    fn test_property_preferred_over_name() {
        let map = parse_head_meta(r#"<meta name="n" property="p" content="v">"#);
        assert_eq!(map.get("p").map(String::as_str), Some("v"));
        assert!(!map.contains_key("n"));
    }

    #[test]
    fn test_skips_incomplete_tags() {
        let head = r#"
            <meta charset="utf-8">
            <meta property="og:type">
            <meta name="robots" content="">
            <meta content="orphan">
        "#;
        assert!(parse_head_meta(head).is_empty());
    }

    #[test]
    fn test_last_occurrence_wins() {
        let head = r#"<meta property="og:locale" content="en_US"><meta property="og:locale" content="de_DE">"#;
        assert_eq!(parse_head_meta(head)["og:locale"], "de_DE");
    }

    #[test]
    fn test_rank_math_fragment() {
        let head = r#"<!-- Search Engine Optimization by Rank Math -->
<meta name="robots" content="follow, index, max-snippet:-1"/>
<link rel="canonical" href="https://cms.example/hello-world/" />
<meta property="og:url" content="https://cms.example/hello-world/" />
<meta property="article:published_time" content="2024-05-01T10:00:00+00:00" />
<meta data-rh="true" name="twitter:label1" content="Time to read" />"#;
        let map = parse_head_meta(head);
        assert_eq!(map.len(), 4);
        assert_eq!(map["og:url"], "https://cms.example/hello-world/");
        assert_eq!(map["twitter:label1"], "Time to read");
    }
}

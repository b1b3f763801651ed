//! JSON-LD normalization.
//!
//! The SEO plugin hands back its schema.org graph as a string that may be
//! wrapped in a `<script type="application/ld+json">` envelope and may be
//! HTML-entity-encoded. This module unwraps it, parses it, moves every
//! backend link onto the frontend origin and re-serializes it twice: compact
//! ([`NormalizedJsonLd::canonical`]) and indented for display
//! ([`NormalizedJsonLd::pretty`]).
//!
//! # Degradation
//!
//! Structured data is an enhancement. Nothing in here returns an error: if no
//! candidate text parses, the decoded text is returned verbatim as both forms
//! and [`NormalizedJsonLd::parsed`] is `false`.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::html::{decode_entities, strip_script_wrapper};
use crate::rewrite::DomainRewriter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedJsonLd {
    /// Compact serialization of the rewritten graph.
    pub canonical: String,
    /// Two-space indented serialization, for display only.
    pub pretty: String,
    /// Whether any candidate text parsed as JSON.
    pub parsed: bool,
}

/// Unwraps, decodes, parses, rewrites and re-serializes a JSON-LD payload.
///
/// Candidates are tried in order: the raw text, the text with its
/// `<script>` envelope stripped, then that text entity-decoded. The first one
/// that parses is walked and every non-image `http` string leaf is passed
/// through [`DomainRewriter::rewrite_link`].
///
/// # Arguments
///
/// - `raw`: the plugin's `jsonLd.raw` value. Blank input yields
///   [`NormalizedJsonLd::default`].
/// - `rewriter`: moves backend links to the frontend origin.
///
/// # Returns
///
/// Both serializations and whether parsing succeeded. Object key order
/// follows the input.
///
/// # Example
///
/// ```rust
/// use headless_press::jsonld::normalize_json_ld;
/// use headless_press::rewrite::DomainRewriter;
///
/// let rewriter = DomainRewriter::new(
///     Some("https://site.example"),
///     Some("https://cms.example"),
///     None,
/// );
/// let out = normalize_json_ld(
///     r#"<script type="application/ld+json">{"url":"https://cms.example/a/"}</script>"#,
///     &rewriter,
/// );
/// assert!(out.parsed);
/// assert_eq!(out.canonical, r#"{"url":"https://site.example/a/"}"#);
/// ```
pub fn normalize_json_ld(raw: &str, rewriter: &DomainRewriter) -> NormalizedJsonLd {
    if raw.trim().is_empty() {
        return NormalizedJsonLd::default();
    }

    let stripped = strip_script_wrapper(raw);
    let decoded = decode_entities(&stripped);

    let parsed = [raw, stripped.as_str(), decoded.as_str()]
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok());

    let Some(mut tree) = parsed else {
        debug!(len = raw.len(), "JSON-LD did not parse; passing decoded text through");
        return NormalizedJsonLd {
            canonical: decoded.clone(),
            pretty: decoded,
            parsed: false,
        };
    };

    rewrite_tree(&mut tree, rewriter);

    let canonical = serde_json::to_string(&tree).unwrap_or_else(|_| decoded.clone());
    let pretty = serde_json::to_string_pretty(&tree).unwrap_or_else(|_| canonical.clone());

    NormalizedJsonLd {
        canonical,
        pretty,
        parsed: true,
    }
}

/// Indents a JSON-LD payload for display without touching any URL.
pub fn prettify_json_ld(raw: &str) -> String {
    normalize_json_ld(raw, &DomainRewriter::default()).pretty
}

/// Rewrites string leaves in place. The tree is a freshly parsed copy, so the
/// caller's input is never modified.
fn rewrite_tree(node: &mut Value, rewriter: &DomainRewriter) {
    match node {
        Value::Array(items) => {
            for item in items {
                rewrite_tree(item, rewriter);
            }
        }
        Value::Object(map) => {
            for value in map.values_mut() {
                rewrite_tree(value, rewriter);
            }
        }
        Value::String(s) => {
            let rewritten = rewriter.rewrite_link(s);
            if rewritten != *s {
                *s = rewritten;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

//! Backend-to-frontend URL rewriting.
//!
//! The CMS emits absolute URLs on its own origin (canonical links, Open Graph
//! URLs, schema.org `@id`s). Before anything reaches presentation those URLs
//! are moved onto the public frontend origin, keeping path, query and
//! fragment intact.
//!
//! # Rules
//!
//! | Input | Result |
//! |-------|--------|
//! | Not an absolute URL | unchanged |
//! | Host is not the backend (or the hostname override) | unchanged |
//! | Backend host | `frontend_origin` + path + query + fragment |
//!
//! Rewriting is fail-open: a missing origin or an unparsable value means the
//! input is returned as-is.
//!
//! Image URLs are served straight from the CMS media origin, so bulk rewriters
//! (structured data, raw head markup) consult [`is_image_url`] and skip them.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

static IMAGE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|svg|avif)(\?.*)?$")
        .expect("Failed to compile image suffix regex - this is a bug")
});

static IMAGE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|svg|avif)$")
        .expect("Failed to compile image path regex - this is a bug")
});

static EMBEDDED_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>]+"#).expect("Failed to compile embedded URL regex - this is a bug")
});

const AVATAR_HOSTS: &[&str] = &["gravatar.com"];

/// Rewrites backend-origin URLs onto the frontend origin.
///
/// Construct once per request (or share; it holds no mutable state) from the
/// configured origins. See [`crate::config::Config::rewriter`].
#[derive(Debug, Clone, Default)]
pub struct DomainRewriter {
    frontend: Option<Url>,
    backend_host: Option<String>,
    hostname_override: Option<String>,
}

impl DomainRewriter {
    /// Creates a rewriter. Values that are absent, blank or unparsable are
    /// treated as unset.
    pub fn new(
        frontend_origin: Option<&str>,
        backend_origin: Option<&str>,
        backend_hostname_override: Option<&str>,
    ) -> Self {
        let frontend = frontend_origin
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| Url::parse(s).ok());
        let backend_host = backend_origin
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| Url::parse(s).ok())
            .and_then(|u| host_key(&u));
        let hostname_override = backend_hostname_override
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty());

        Self {
            frontend,
            backend_host,
            hostname_override,
        }
    }

    /// Whether rewriting can change anything at all.
    pub fn is_active(&self) -> bool {
        self.frontend.is_some() && (self.backend_host.is_some() || self.hostname_override.is_some())
    }

    /// The frontend origin without a trailing slash, if configured.
    pub fn frontend_origin(&self) -> Option<String> {
        self.frontend
            .as_ref()
            .map(|u| u.as_str().trim_end_matches('/').to_string())
    }

    /// Whether `url` points at the CMS backend.
    pub fn is_backend_url(&self, url: &Url) -> bool {
        let Some(host) = host_key(url) else {
            return false;
        };
        self.backend_host.as_deref() == Some(host.as_str())
            || self.hostname_override.as_deref() == Some(host.as_str())
    }

    /// Rewrites a single value. Returns the input unchanged unless it is an
    /// absolute URL on the backend host.
    pub fn rewrite(&self, value: &str) -> String {
        let Some(frontend) = &self.frontend else {
            return value.to_string();
        };
        let Ok(parsed) = Url::parse(value) else {
            return value.to_string();
        };
        if !self.is_backend_url(&parsed) {
            return value.to_string();
        }

        rebase(frontend, parsed.path(), parsed.query(), parsed.fragment()).into()
    }

    pub fn rewrite_opt(&self, value: Option<&str>) -> Option<String> {
        value.map(|v| self.rewrite(v))
    }

    /// Rewrites `value` when it looks like a link, leaving images alone.
    /// This is the rule applied to every leaf during bulk rewriting.
    pub fn rewrite_link(&self, value: &str) -> String {
        if value.starts_with("http") && !is_image_url(value) {
            self.rewrite(value)
        } else {
            value.to_string()
        }
    }

    /// Rewrites every non-image URL embedded in free text such as raw
    /// `<head>` markup.
    pub fn rewrite_text(&self, text: &str) -> String {
        if !self.is_active() {
            return text.to_string();
        }
        EMBEDDED_URL_RE
            .replace_all(text, |caps: &Captures| self.rewrite_link(&caps[0]))
            .into_owned()
    }

    /// Rebases `url` (any host) onto the frontend origin, or builds a
    /// frontend URL from `fallback_path` when `url` is absent.
    ///
    /// Without a frontend origin the input (or the fallback path) is
    /// returned untouched.
    pub fn frontend_url(&self, fallback_path: &str, url: Option<&str>) -> String {
        let url = url.filter(|u| !u.is_empty());
        let Some(frontend) = &self.frontend else {
            return url.unwrap_or(fallback_path).to_string();
        };

        match url {
            Some(u) => match Url::parse(u) {
                Ok(parsed) => {
                    rebase(frontend, parsed.path(), parsed.query(), parsed.fragment()).into()
                }
                Err(_) => u.to_string(),
            },
            None => {
                let (rest, fragment) = match fallback_path.split_once('#') {
                    Some((rest, fragment)) => (rest, Some(fragment)),
                    None => (fallback_path, None),
                };
                let (path, query) = match rest.split_once('?') {
                    Some((path, query)) => (path, Some(query)),
                    None => (rest, None),
                };
                rebase(frontend, path, query, fragment).into()
            }
        }
    }
}

/// One-shot form of [`DomainRewriter::rewrite`].
pub fn rewrite_domain(
    value: &str,
    frontend_origin: Option<&str>,
    backend_origin: Option<&str>,
    backend_hostname_override: Option<&str>,
) -> String {
    DomainRewriter::new(frontend_origin, backend_origin, backend_hostname_override).rewrite(value)
}

/// Recognizes URLs that point at images: `data:image/` URIs, image file
/// extensions (query ignored), and avatar services.
pub fn is_image_url(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value
        .get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/"))
    {
        return true;
    }
    if IMAGE_SUFFIX_RE.is_match(value) {
        return true;
    }

    let Ok(parsed) = Url::parse(value) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = parsed.path().to_ascii_lowercase();

    AVATAR_HOSTS.iter().any(|h| host.contains(h))
        || path.contains("/avatar/")
        || IMAGE_PATH_RE.is_match(&path)
}

/// `host[:port]`, lowercased, with default ports omitted.
fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Puts `path`, `query` and `fragment` on a copy of `frontend`.
///
/// A path such as `//other.example/x` stays a path on the frontend host; it
/// is never read as an authority.
fn rebase(frontend: &Url, path: &str, query: Option<&str>, fragment: Option<&str>) -> Url {
    let mut out = frontend.clone();
    out.set_path(path);
    out.set_query(query);
    out.set_fragment(fragment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: &str = "https://site.example";
    const B: &str = "https://cms.example";

    fn rewriter() -> DomainRewriter {
        DomainRewriter::new(Some(F), Some(B), None)
    }

    #[test]
    fn test_backend_url_rewritten() {
        assert_eq!(
            rewrite_domain("https://cms.example/foo?x=1#y", Some(F), Some(B), None),
            "https://site.example/foo?x=1#y"
        );
    }

    #[test]
    fn test_backend_root_rewritten() {
        assert_eq!(rewriter().rewrite("https://cms.example"), "https://site.example/");
    }

    #[test]
    fn test_other_host_untouched() {
        assert_eq!(
            rewriter().rewrite("https://other.example/a"),
            "https://other.example/a"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let r = rewriter();
        for u in [
            "https://cms.example/blog/hello/",
            "https://site.example/already?x=1",
            "https://cms.example/#top",
        ] {
            let once = r.rewrite(u);
            assert_eq!(r.rewrite(&once), once, "double rewrite changed {}", u);
        }
    }

    #[test]
    fn test_malformed_and_relative_pass_through() {
        let r = rewriter();
        assert_eq!(r.rewrite("not a url"), "not a url");
        assert_eq!(r.rewrite("/relative/path"), "/relative/path");
        assert_eq!(r.rewrite(""), "");
    }

    #[test]
    fn test_missing_origins_are_noop() {
        let u = "https://cms.example/foo";
        assert_eq!(rewrite_domain(u, None, Some(B), None), u);
        assert_eq!(rewrite_domain(u, Some(F), None, None), u);
        assert!(!DomainRewriter::new(Some(F), None, None).is_active());
        assert!(!DomainRewriter::new(None, Some(B), None).is_active());
    }

    #[test]
    fn test_port_is_part_of_host_match() {
        let r = DomainRewriter::new(Some(F), Some("http://localhost:8080"), None);
        assert_eq!(r.rewrite("http://localhost:8080/a"), "https://site.example/a");
        assert_eq!(r.rewrite("http://localhost:9090/a"), "http://localhost:9090/a");
    }

    #[test]
    fn test_hostname_override_matches() {
        let r = DomainRewriter::new(Some(F), Some(B), Some("WordPress:80"));
        // Default port collapses, so the override must name the host only.
        assert_eq!(r.rewrite("http://wordpress:80/p"), "http://wordpress:80/p");

        let r = DomainRewriter::new(Some(F), Some(B), Some("wordpress"));
        assert_eq!(r.rewrite("http://wordpress/p?q=1"), "https://site.example/p?q=1");
        assert_eq!(r.rewrite("https://cms.example/p"), "https://site.example/p");
    }

    #[test]
    fn test_double_slash_path_stays_on_frontend() {
        let r = rewriter();
        for u in [
            "https://cms.example//evil.example/x",
            "https://cms.example//evil.example",
            "https://cms.example///evil.example/x?q=1#f",
        ] {
            let out = r.rewrite(u);
            assert!(out.starts_with("https://site.example/"), "{} -> {}", u, out);
            assert_eq!(Url::parse(&out).unwrap().host_str(), Some("site.example"));
        }
        assert_eq!(
            r.rewrite("https://cms.example//evil.example/x"),
            "https://site.example//evil.example/x"
        );

        let built = r.frontend_url("/", Some("https://cms.example//evil.example/x"));
        assert_eq!(Url::parse(&built).unwrap().host_str(), Some("site.example"));
        let built = r.frontend_url("//evil.example/x", None);
        assert_eq!(Url::parse(&built).unwrap().host_str(), Some("site.example"));
    }

    #[test]
    fn test_rewrite_text_cannot_inject_host() {
        let head = r#"<link rel="canonical" href="https://cms.example//evil.example/login" />"#;
        let out = rewriter().rewrite_text(head);
        assert!(!out.contains("\"https://evil.example"), "{}", out);
        assert!(out.contains("https://site.example//evil.example/login"));
    }

    #[test]
    fn test_fallback_path_keeps_query_and_fragment() {
        assert_eq!(
            rewriter().frontend_url("/a/b?x=1#top", None),
            "https://site.example/a/b?x=1#top"
        );
    }

    #[test]
    fn test_override_alone_is_enough() {
        let r = DomainRewriter::new(Some(F), None, Some("cms.internal:8080"));
        assert!(r.is_active());
        assert_eq!(
            r.rewrite("http://cms.internal:8080/x"),
            "https://site.example/x"
        );
    }

    #[test]
    fn test_is_image_url() {
        assert!(is_image_url("data:image/png;base64,AAAA"));
        assert!(is_image_url("DATA:IMAGE/svg+xml,<svg/>"));
        assert!(is_image_url("https://cms.example/wp-content/uploads/x.png"));
        assert!(is_image_url("https://cms.example/uploads/photo.JPEG?w=300"));
        assert!(is_image_url("https://cms.example/a.avif#frag"));
        assert!(is_image_url("https://secure.gravatar.com/abc?s=96"));
        assert!(is_image_url("https://cms.example/avatar/123"));
        assert!(!is_image_url("https://cms.example/blog/png-tips/"));
        assert!(!is_image_url("data:text/plain,hello"));
        assert!(!is_image_url(""));
        assert!(!is_image_url("not a url"));
    }

    #[test]
    fn test_rewrite_link_skips_images() {
        let r = rewriter();
        let img = "https://cms.example/wp-content/uploads/x.png";
        assert_eq!(r.rewrite_link(img), img);
        assert_eq!(r.rewrite_link("https://cms.example/a"), "https://site.example/a");
        assert_eq!(r.rewrite_link("mailto:x@cms.example"), "mailto:x@cms.example");
    }

    #[test]
    fn test_rewrite_text_in_markup() {
        let r = rewriter();
        let head = r#"<link rel="canonical" href="https://cms.example/post/" /><meta property="og:image" content="https://cms.example/uploads/a.jpg" />"#;
        let out = r.rewrite_text(head);
        assert!(out.contains(r#"href="https://site.example/post/""#));
        assert!(out.contains("https://cms.example/uploads/a.jpg"));
    }

    #[test]
    fn test_frontend_url() {
        let r = rewriter();
        assert_eq!(
            r.frontend_url("/blog/x", Some("https://anything.example/blog/y/")),
            "https://site.example/blog/y/"
        );
        assert_eq!(r.frontend_url("/blog/x", None), "https://site.example/blog/x");
        assert_eq!(r.frontend_url("/blog/x", Some("")), "https://site.example/blog/x");

        let bare = DomainRewriter::default();
        assert_eq!(bare.frontend_url("/blog/x", None), "/blog/x");
        assert_eq!(
            bare.frontend_url("/blog/x", Some("https://cms.example/y")),
            "https://cms.example/y"
        );
    }

    #[test]
    fn test_frontend_origin_trims_slash() {
        assert_eq!(rewriter().frontend_origin().as_deref(), Some("https://site.example"));
    }
}

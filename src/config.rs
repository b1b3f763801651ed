//! TOML configuration parsing.
//!
//! Origins and preview credentials may also come from the environment, which
//! takes precedence over the file so secrets never need to be committed.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `HPRESS_FRONTEND_ORIGIN` | `site.frontend_origin` |
//! | `HPRESS_BACKEND_ORIGIN` | `cms.backend_origin` |
//! | `HPRESS_BACKEND_HOSTNAME` | `cms.backend_hostname` |
//! | `HPRESS_PREVIEW_SECRET` | `preview.secret` |
//! | `HPRESS_PREVIEW_USER` | `preview.username` |
//! | `HPRESS_PREVIEW_PASSWORD` | `preview.password` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use crate::rewrite::DomainRewriter;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    pub cms: CmsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SiteConfig {
    /// Public origin this frontend is served under.
    #[serde(default)]
    pub frontend_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CmsConfig {
    pub graphql_url: String,
    /// Origin the CMS embeds in its own URLs. Defaults to the origin of
    /// `graphql_url` when unset.
    #[serde(default)]
    pub backend_origin: Option<String>,
    /// Internal `host[:port]` the CMS is reached under when it differs from
    /// its public origin.
    #[serde(default)]
    pub backend_hostname: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_archive_page_size")]
    pub archive_page_size: u32,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_archive_page_size() -> u32 {
    100
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PreviewConfig {
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl PreviewConfig {
    /// Login credentials, when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Config {
    /// A config with no origins set, used by commands that can run without
    /// a config file. URL rewriting is a no-op under this config.
    pub fn minimal() -> Self {
        Self {
            site: SiteConfig::default(),
            cms: CmsConfig {
                graphql_url: "http://localhost/graphql".to_string(),
                backend_origin: None,
                backend_hostname: None,
                timeout_secs: default_timeout_secs(),
                archive_page_size: default_archive_page_size(),
            },
            preview: PreviewConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Backend origin, falling back to the origin of the GraphQL endpoint.
    pub fn backend_origin(&self) -> Option<String> {
        if let Some(origin) = self.cms.backend_origin.as_deref().filter(|s| !s.is_empty()) {
            return Some(origin.to_string());
        }
        Url::parse(&self.cms.graphql_url)
            .ok()
            .map(|u| u.origin().ascii_serialization())
            .filter(|o| o != "null")
    }

    /// Builds the rewriter for this deployment's origins.
    pub fn rewriter(&self) -> DomainRewriter {
        DomainRewriter::new(
            self.site.frontend_origin.as_deref(),
            self.backend_origin().as_deref(),
            self.cms.backend_hostname.as_deref(),
        )
    }

    /// Applies `HPRESS_*` environment overrides through `lookup`.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HPRESS_FRONTEND_ORIGIN") {
            self.site.frontend_origin = Some(v);
        }
        if let Some(v) = get("HPRESS_BACKEND_ORIGIN") {
            self.cms.backend_origin = Some(v);
        }
        if let Some(v) = get("HPRESS_BACKEND_HOSTNAME") {
            self.cms.backend_hostname = Some(v);
        }
        if let Some(v) = get("HPRESS_PREVIEW_SECRET") {
            self.preview.secret = Some(v);
        }
        if let Some(v) = get("HPRESS_PREVIEW_USER") {
            self.preview.username = Some(v);
        }
        if let Some(v) = get("HPRESS_PREVIEW_PASSWORD") {
            self.preview.password = Some(v);
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.apply_env(|key| std::env::var(key).ok());

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let graphql = Url::parse(&config.cms.graphql_url)
        .with_context(|| format!("cms.graphql_url is not a valid URL: {}", config.cms.graphql_url))?;
    if !matches!(graphql.scheme(), "http" | "https") {
        anyhow::bail!("cms.graphql_url must use http or https");
    }

    if let Some(origin) = &config.site.frontend_origin {
        Url::parse(origin)
            .with_context(|| format!("site.frontend_origin is not a valid URL: {}", origin))?;
    }
    if let Some(origin) = &config.cms.backend_origin {
        Url::parse(origin)
            .with_context(|| format!("cms.backend_origin is not a valid URL: {}", origin))?;
    }

    if config.cms.timeout_secs == 0 {
        anyhow::bail!("cms.timeout_secs must be > 0");
    }
    if !(1..=100).contains(&config.cms.archive_page_size) {
        anyhow::bail!("cms.archive_page_size must be in [1, 100]");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(toml_str: &str) -> Config {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = parse(
            r#"
[cms]
graphql_url = "https://cms.example/graphql"
"#,
        );
        assert_eq!(cfg.cms.timeout_secs, 30);
        assert_eq!(cfg.cms.archive_page_size, 100);
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
        assert!(cfg.site.frontend_origin.is_none());
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_backend_origin_falls_back_to_graphql_origin() {
        let cfg = parse(
            r#"
[cms]
graphql_url = "https://cms.example:8443/graphql"
"#,
        );
        assert_eq!(cfg.backend_origin().as_deref(), Some("https://cms.example:8443"));
    }

    #[test]
    fn test_explicit_backend_origin_wins() {
        let cfg = parse(
            r#"
[cms]
graphql_url = "http://wordpress:80/graphql"
backend_origin = "https://cms.example"
"#,
        );
        assert_eq!(cfg.backend_origin().as_deref(), Some("https://cms.example"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut cfg = parse(
            r#"
[site]
frontend_origin = "https://old.example"

[cms]
graphql_url = "https://cms.example/graphql"

[preview]
secret = "from-file"
"#,
        );
        let env: HashMap<&str, &str> = [
            ("HPRESS_FRONTEND_ORIGIN", "https://site.example"),
            ("HPRESS_PREVIEW_SECRET", "from-env"),
            ("HPRESS_PREVIEW_USER", "   "),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.site.frontend_origin.as_deref(), Some("https://site.example"));
        assert_eq!(cfg.preview.secret.as_deref(), Some("from-env"));
        assert!(cfg.preview.username.is_none(), "blank env values are ignored");
    }

    #[test]
    fn test_rejects_bad_page_size() {
        let cfg = parse(
            r#"
[cms]
graphql_url = "https://cms.example/graphql"
archive_page_size = 0
"#,
        );
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_non_http_graphql_url() {
        let cfg = parse(
            r#"
[cms]
graphql_url = "ftp://cms.example/graphql"
"#,
        );
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let mut preview = PreviewConfig {
            username: Some("editor".into()),
            ..Default::default()
        };
        assert!(preview.credentials().is_none());
        preview.password = Some("app-pass".into());
        assert_eq!(preview.credentials(), Some(("editor", "app-pass")));
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("hpress.toml");
        std::fs::write(
            &path,
            r#"
[site]
frontend_origin = "https://site.example"

[cms]
graphql_url = "https://cms.example/graphql"

[server]
bind = "0.0.0.0:8080"
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert!(cfg.rewriter().is_active());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/hpress.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

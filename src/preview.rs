//! Preview activation.
//!
//! Editors open `/api/preview?secret=…&id=…` from the CMS. After checking the
//! shared secret, the service logs in with the preview account, confirms the
//! node exists and redirects to the page that renders it, handing the auth
//! token to the browser in the `wp_jwt` cookie. Later preview reads send that
//! cookie back and the resolver uses it as the bearer token.

use thiserror::Error;
use tracing::{info, warn};

use crate::cms::ContentApi;
use crate::config::Config;
use crate::error::CmsError;

/// Cookie carrying the preview auth token.
pub const SESSION_COOKIE: &str = "wp_jwt";

#[derive(Debug, Error)]
pub enum PreviewError {
    /// A required setting is absent; the write path never guesses.
    #[error("preview is not configured: missing {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid token")]
    Unauthorized,

    #[error("Invalid id")]
    InvalidId,

    #[error(transparent)]
    Cms(#[from] CmsError),
}

/// Where to send the editor, and the cookie to set on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRedirect {
    pub location: String,
    pub token: String,
}

impl PreviewRedirect {
    pub fn set_cookie(&self) -> String {
        format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, self.token)
    }
}

/// Validates a preview request and computes its redirect.
pub async fn activate_preview(
    api: &ContentApi,
    config: &Config,
    secret: Option<&str>,
    id: Option<&str>,
) -> Result<PreviewRedirect, PreviewError> {
    let expected = config
        .preview
        .secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(PreviewError::ConfigMissing("preview.secret"))?;

    if secret != Some(expected) {
        warn!("preview request with a bad secret");
        return Err(PreviewError::Unauthorized);
    }
    let id = id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(PreviewError::Unauthorized)?;

    let (username, password) = config
        .preview
        .credentials()
        .ok_or(PreviewError::ConfigMissing("preview.username/preview.password"))?;
    let frontend = config
        .site
        .frontend_origin
        .as_deref()
        .map(|o| o.trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .ok_or(PreviewError::ConfigMissing("site.frontend_origin"))?;

    let token = api.login(username, password).await?;
    let node = api
        .preview_node(id, &token)
        .await?
        .ok_or(PreviewError::InvalidId)?;

    let path = if node.is_draft() {
        format!("/preview/{}", node.database_id)
    } else {
        let uri = node.uri.as_deref().unwrap_or("/");
        if uri.starts_with('/') {
            uri.to_string()
        } else {
            format!("/{}", uri)
        }
    };

    info!(id, draft = node.is_draft(), "preview activated");
    Ok(PreviewRedirect {
        location: format!("{}{}", frontend, path),
        token,
    })
}

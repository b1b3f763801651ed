//! Path → content resolution.
//!
//! Resolution is two-phase. A cheap `ContentInfo` probe answers "does this
//! path exist, and what type is it?"; the second phase runs the full
//! single-item query for that type by database id. Unknown content types are
//! an explicit outcome ([`Resolution::NotImplemented`]), not an error.
//!
//! Paths containing a `preview/` segment look the node up by database id in
//! preview mode, authenticated with the caller's session token. Without a
//! token the lookup is anonymous and the CMS hides drafts. Only trusted
//! callers (the CLI) may attach preview credentials so the resolver can log
//! in by itself.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cms::{ContentApi, IdType};
use crate::error::CmsError;
use crate::models::{ArchiveLink, ContentItem, ContentType};
use crate::rewrite::DomainRewriter;
use crate::view_model::{build_view_model, ViewModel};

/// Outcome of resolving a request path.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// The root path: links to the archive listings.
    Archive { links: Vec<ArchiveLink> },
    Content { view: Box<ViewModel> },
    NotFound,
    /// The CMS knows the node but no renderer exists for its type.
    NotImplemented { content_type: String },
}

/// How a path is looked up in the CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub id: String,
    pub id_type: IdType,
    pub preview: bool,
}

/// Joins catch-all segments into a path: `["a", "b"]` → `/a/b`, none → `/`.
pub fn normalize_path<S: AsRef<str>>(segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.as_ref().trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}

/// Decides how `path` is looked up. `None` means the root path.
pub fn lookup_for(path: &str) -> Option<Lookup> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(pos) = segments.iter().position(|s| *s == "preview") {
        let key = segments[pos + 1..].join("/");
        if !key.is_empty() {
            return Some(Lookup {
                id: key,
                id_type: IdType::DatabaseId,
                preview: true,
            });
        }
    }

    Some(Lookup {
        id: format!("/{}", segments.join("/")),
        id_type: IdType::Uri,
        preview: false,
    })
}

/// The fixed archive index shown at `/`.
pub fn archive_links() -> Vec<ArchiveLink> {
    [
        ("/blog", "Blog Archive"),
        ("/case-study", "Case Study Archive"),
        ("/job", "Job Archive"),
    ]
    .into_iter()
    .map(|(href, label)| ArchiveLink {
        href: href.to_string(),
        label: label.to_string(),
    })
    .collect()
}

/// Content types served under their own `/{archive}/{slug}` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugRoute {
    Post,
    Job,
    CaseStudy,
}

#[derive(Clone)]
pub struct Resolver {
    api: ContentApi,
    rewriter: DomainRewriter,
    credentials: Option<(String, String)>,
}

impl Resolver {
    pub fn new(api: ContentApi, rewriter: DomainRewriter) -> Self {
        Self {
            api,
            rewriter,
            credentials: None,
        }
    }

    /// Preview credentials used when a preview path arrives without a
    /// session token. Never set this on a resolver that serves untrusted
    /// requests: any visitor could then read drafts.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn rewriter(&self) -> &DomainRewriter {
        &self.rewriter
    }

    /// Resolves a request path to a view model or a terminal outcome.
    ///
    /// # Arguments
    ///
    /// - `path`: the request path, e.g. `/about/` or `/preview/42`. The root
    ///   path answers with the archive index without contacting the CMS.
    /// - `session_token`: the visitor's preview token (the `wp_jwt` cookie).
    ///   Sent as a bearer token on preview lookups only.
    ///
    /// # Returns
    ///
    /// - [`Resolution::Archive`] for `/`.
    /// - [`Resolution::Content`] with the built [`ViewModel`].
    /// - [`Resolution::NotFound`] when either phase returns no node.
    /// - [`Resolution::NotImplemented`] for content types without a renderer.
    ///
    /// Transport failures (network, HTTP status, GraphQL errors, malformed
    /// data) are returned as [`CmsError`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use headless_press::cms::{ContentApi, HttpCmsClient};
    /// use headless_press::resolver::{Resolution, Resolver};
    /// use std::sync::Arc;
    ///
    /// # async fn example(config: &headless_press::config::Config) -> anyhow::Result<()> {
    /// let api = ContentApi::new(Arc::new(HttpCmsClient::new(&config.cms)?));
    /// let resolver = Resolver::new(api, config.rewriter());
    /// if let Resolution::Content { view } = resolver.resolve("/about/", None).await? {
    ///     println!("{:?}", view.metadata.title);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn resolve(
        &self,
        path: &str,
        session_token: Option<&str>,
    ) -> Result<Resolution, CmsError> {
        let Some(lookup) = lookup_for(path) else {
            return Ok(Resolution::Archive {
                links: archive_links(),
            });
        };

        let token = if lookup.preview {
            self.preview_token(session_token).await?
        } else {
            None
        };
        let token = token.as_deref();

        let Some(info) = self
            .api
            .content_info(&lookup.id, lookup.id_type, lookup.preview, token)
            .await?
        else {
            info!(path, "no content node for path");
            return Ok(Resolution::NotFound);
        };

        let content_type = info.content_type();
        debug!(path, content_type = content_type.as_str(), database_id = info.database_id, "resolved content type");

        let id = info.database_id.to_string();
        let preview = lookup.preview;
        let item = match content_type {
            ContentType::Page => self
                .api
                .page(&id, IdType::DatabaseId, preview, token)
                .await?
                .map(ContentItem::Page),
            ContentType::Post => self
                .api
                .post(&id, IdType::DatabaseId, preview, token)
                .await?
                .map(ContentItem::Post),
            ContentType::Job => self
                .api
                .job(&id, IdType::DatabaseId, preview, token)
                .await?
                .map(ContentItem::Job),
            ContentType::CaseStudy => self
                .api
                .case_study(&id, IdType::DatabaseId, preview, token)
                .await?
                .map(ContentItem::CaseStudy),
            ContentType::Unknown(name) => {
                warn!(path, content_type = %name, "no renderer for content type");
                return Ok(Resolution::NotImplemented { content_type: name });
            }
        };

        Ok(self.present(item))
    }

    /// Resolves a single published item by slug, for the per-type routes.
    pub async fn resolve_slug(
        &self,
        route: SlugRoute,
        slug: &str,
    ) -> Result<Resolution, CmsError> {
        let item = match route {
            SlugRoute::Post => self
                .api
                .post(slug, IdType::Slug, false, None)
                .await?
                .map(ContentItem::Post),
            SlugRoute::Job => self
                .api
                .job(slug, IdType::Slug, false, None)
                .await?
                .map(ContentItem::Job),
            SlugRoute::CaseStudy => self
                .api
                .case_study(slug, IdType::Slug, false, None)
                .await?
                .map(ContentItem::CaseStudy),
        };

        Ok(self.present(item))
    }

    fn present(&self, item: Option<ContentItem>) -> Resolution {
        match item {
            Some(item) => Resolution::Content {
                view: Box::new(build_view_model(item, &self.rewriter)),
            },
            None => Resolution::NotFound,
        }
    }

    async fn preview_token(&self, session_token: Option<&str>) -> Result<Option<String>, CmsError> {
        if let Some(token) = session_token.filter(|t| !t.is_empty()) {
            return Ok(Some(token.to_string()));
        }
        match &self.credentials {
            Some((username, password)) => {
                debug!("logging in for preview read");
                self.api.login(username, password).await.map(Some)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{CmsClient, GraphqlRequest};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Answers by operation name and records every request.
    #[derive(Default)]
    struct Scripted {
        answers: HashMap<&'static str, Value>,
        seen: Mutex<Vec<GraphqlRequest>>,
    }

    impl Scripted {
        fn answer(mut self, operation: &'static str, data: Value) -> Self {
            self.answers.insert(operation, data);
            self
        }

        fn operations(&self) -> Vec<&'static str> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.operation_name)
                .collect()
        }
    }

    #[async_trait]
    impl CmsClient for Scripted {
        async fn execute(&self, request: GraphqlRequest) -> Result<Value, CmsError> {
            let data = self
                .answers
                .get(request.operation_name)
                .cloned()
                .unwrap_or_else(|| json!({}));
            self.seen.lock().unwrap().push(request);
            Ok(data)
        }
    }

    fn resolver(client: Scripted) -> (Resolver, Arc<Scripted>) {
        let client = Arc::new(client);
        let rewriter =
            DomainRewriter::new(Some("https://site.example"), Some("https://cms.example"), None);
        (
            Resolver::new(ContentApi::new(client.clone()), rewriter),
            client,
        )
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path::<&str>(&[]), "/");
        assert_eq!(normalize_path(&["blog", "hello"]), "/blog/hello");
        assert_eq!(normalize_path(&["", "/about/"]), "/about");
    }

    #[test]
    fn test_lookup_for() {
        assert_eq!(lookup_for("/"), None);
        assert_eq!(lookup_for(""), None);
        assert_eq!(
            lookup_for("/preview/42"),
            Some(Lookup {
                id: "42".into(),
                id_type: IdType::DatabaseId,
                preview: true
            })
        );
        assert_eq!(
            lookup_for("/about/team/"),
            Some(Lookup {
                id: "/about/team".into(),
                id_type: IdType::Uri,
                preview: false
            })
        );
        assert_eq!(lookup_for("/preview").unwrap().id_type, IdType::Uri);
    }

    #[tokio::test]
    async fn test_root_is_archive_without_query() {
        let (r, client) = resolver(Scripted::default());
        let res = r.resolve("/", None).await.unwrap();
        match res {
            Resolution::Archive { links } => {
                assert_eq!(links.len(), 3);
                assert_eq!(links[0].href, "/blog");
            }
            other => panic!("expected archive, got {:?}", other),
        }
        assert!(client.operations().is_empty());
    }

    #[tokio::test]
    async fn test_preview_path_uses_database_id() {
        let (r, client) = resolver(
            Scripted::default()
                .answer("ContentInfo", json!({ "contentNode": { "databaseId": 42, "contentTypeName": "post" } }))
                .answer("PostById", json!({ "post": { "databaseId": 42, "title": "Draft" } })),
        );
        let res = r.resolve("/preview/42", Some("jwt")).await.unwrap();
        assert!(matches!(res, Resolution::Content { .. }));

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].operation_name, "ContentInfo");
        assert_eq!(seen[0].variables["id"], "42");
        assert_eq!(seen[0].variables["idType"], "DATABASE_ID");
        assert_eq!(seen[0].variables["asPreview"], true);
        assert_eq!(seen[0].auth_token.as_deref(), Some("jwt"));
        assert_eq!(seen[1].auth_token.as_deref(), Some("jwt"));
    }

    #[tokio::test]
    async fn test_preview_logs_in_without_session() {
        let (r, client) = resolver(
            Scripted::default()
                .answer("LoginUser", json!({ "login": { "authToken": "fresh" } }))
                .answer("ContentInfo", json!({ "contentNode": null })),
        );
        let r = r.with_credentials("editor", "pw");
        let res = r.resolve("/preview/7", None).await.unwrap();
        assert!(matches!(res, Resolution::NotFound));
        assert_eq!(client.operations(), vec!["LoginUser", "ContentInfo"]);
        assert_eq!(
            client.seen.lock().unwrap()[1].auth_token.as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_unknown_type_not_implemented() {
        let (r, client) = resolver(Scripted::default().answer(
            "ContentInfo",
            json!({ "contentNode": { "databaseId": 3, "contentTypeName": "event" } }),
        ));
        let res = r.resolve("/events/launch", None).await.unwrap();
        match res {
            Resolution::NotImplemented { content_type } => assert_eq!(content_type, "event"),
            other => panic!("expected not implemented, got {:?}", other),
        }
        assert_eq!(client.operations(), vec!["ContentInfo"]);
    }

    #[tokio::test]
    async fn test_uri_lookup_then_database_id() {
        let (r, client) = resolver(
            Scripted::default()
                .answer("ContentInfo", json!({ "contentNode": { "databaseId": 9, "contentTypeName": "caseStudy" } }))
                .answer("CaseStudyById", json!({ "caseStudy": { "databaseId": 9, "title": "Acme" } })),
        );
        let res = r.resolve("/case-study/acme", None).await.unwrap();
        let Resolution::Content { view } = res else {
            panic!("expected content");
        };
        assert_eq!(view.content.title(), Some("Acme"));

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].variables["id"], "/case-study/acme");
        assert_eq!(seen[0].variables["idType"], "URI");
        assert_eq!(seen[0].auth_token, None);
        assert_eq!(seen[1].variables["id"], "9");
        assert_eq!(seen[1].variables["idType"], "DATABASE_ID");
    }

    #[tokio::test]
    async fn test_missing_second_phase_is_not_found() {
        let (r, _) = resolver(
            Scripted::default()
                .answer("ContentInfo", json!({ "contentNode": { "databaseId": 1, "contentTypeName": "page" } }))
                .answer("PageById", json!({ "page": null })),
        );
        assert!(matches!(
            r.resolve("/gone", None).await.unwrap(),
            Resolution::NotFound
        ));
    }

    #[tokio::test]
    async fn test_resolve_slug_uses_slug_id_type() {
        let (r, client) = resolver(
            Scripted::default().answer("JobById", json!({ "job": { "databaseId": 4, "slug": "rust-dev" } })),
        );
        let res = r.resolve_slug(SlugRoute::Job, "rust-dev").await.unwrap();
        assert!(matches!(res, Resolution::Content { .. }));
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].variables["idType"], "SLUG");
        assert_eq!(seen[0].variables["asPreview"], false);
    }

    #[test]
    fn test_resolution_serializes_kind() {
        let v = serde_json::to_value(Resolution::NotImplemented {
            content_type: "event".into(),
        })
        .unwrap();
        assert_eq!(v["kind"], "not_implemented");
        assert_eq!(v["content_type"], "event");
        assert_eq!(serde_json::to_value(Resolution::NotFound).unwrap()["kind"], "not_found");
    }
}

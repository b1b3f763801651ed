//! CMS access.
//!
//! [`CmsClient`] is the transport seam: it executes one GraphQL operation and
//! hands back the `data` object. [`HttpCmsClient`] is the production
//! implementation over reqwest; tests plug in an in-memory client instead.
//!
//! [`ContentApi`] layers typed operations on top of any client and is what
//! the resolver, the preview flow and the server talk to.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::CmsConfig;
use crate::error::CmsError;
use crate::models::{CaseStudy, ContentInfo, Job, Page, Post};
use crate::queries::{self, Operation};

/// A single GraphQL call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: Value,
    /// Bearer token for authenticated (preview) reads. Sent as a header,
    /// never in the body.
    #[serde(skip)]
    pub auth_token: Option<String>,
}

impl GraphqlRequest {
    pub fn new(operation: &Operation, variables: Value) -> Self {
        Self {
            operation_name: operation.name,
            query: operation.document,
            variables,
            auth_token: None,
        }
    }

    pub fn with_auth(mut self, token: Option<&str>) -> Self {
        self.auth_token = token.map(str::to_string);
        self
    }
}

/// Executes GraphQL operations against the CMS.
///
/// Implementations return the response's `data` object, or a [`CmsError`]
/// for anything that prevents a usable answer (network, HTTP status,
/// GraphQL `errors`).
#[async_trait]
pub trait CmsClient: Send + Sync {
    async fn execute(&self, request: GraphqlRequest) -> Result<Value, CmsError>;
}

/// How a lookup identifies its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdType {
    Uri,
    DatabaseId,
    Slug,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Uri => "URI",
            IdType::DatabaseId => "DATABASE_ID",
            IdType::Slug => "SLUG",
        }
    }
}

// ============ reqwest transport ============

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorItem {
    #[serde(default)]
    message: String,
}

/// GraphQL over HTTP POST.
pub struct HttpCmsClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCmsClient {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("headless-press/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.graphql_url.clone(),
        })
    }
}

#[async_trait]
impl CmsClient for HttpCmsClient {
    async fn execute(&self, request: GraphqlRequest) -> Result<Value, CmsError> {
        let operation = request.operation_name;
        debug!(operation, "sending GraphQL request");

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(token) = &request.auth_token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(operation, status = status.as_u16(), "CMS returned an error status");
            return Err(CmsError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let body: GraphqlResponse = resp
            .json()
            .await
            .map_err(|e| CmsError::malformed(operation, e.to_string()))?;

        if !body.errors.is_empty() {
            return Err(CmsError::GraphQl {
                operation: operation.to_string(),
                messages: body.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        body.data
            .ok_or_else(|| CmsError::malformed(operation, "response has no data"))
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

// ============ Typed operations ============

/// Typed access to the CMS's named operations.
///
/// Every operation decodes `data.<root field>` into a model type. A `null`
/// root is a normal `Ok(None)`; only transport problems are errors.
///
/// # Example
///
/// ```rust,no_run
/// use headless_press::cms::{ContentApi, HttpCmsClient, IdType};
/// use std::sync::Arc;
///
/// # async fn example(config: &headless_press::config::Config) -> anyhow::Result<()> {
/// let api = ContentApi::new(Arc::new(HttpCmsClient::new(&config.cms)?));
/// if let Some(info) = api.content_info("/about", IdType::Uri, false, None).await? {
///     println!("{} is a {}", info.database_id, info.content_type_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ContentApi {
    client: Arc<dyn CmsClient>,
}

impl ContentApi {
    pub fn new(client: Arc<dyn CmsClient>) -> Self {
        Self { client }
    }

    /// Runs `operation` and decodes `data.<root_field>`. A `null` root is
    /// `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
        auth_token: Option<&str>,
    ) -> Result<Option<T>, CmsError> {
        let request = GraphqlRequest::new(operation, variables).with_auth(auth_token);
        let mut data = self.client.execute(request).await?;

        match data.get_mut(operation.root_field).map(Value::take) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| CmsError::malformed(operation.name, e.to_string())),
        }
    }

    async fn fetch_single<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        id: &str,
        id_type: IdType,
        as_preview: bool,
        auth_token: Option<&str>,
    ) -> Result<Option<T>, CmsError> {
        let variables = json!({
            "id": id,
            "idType": id_type.as_str(),
            "asPreview": as_preview,
        });
        self.fetch(operation, variables, auth_token).await
    }

    async fn fetch_archive<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        first: u32,
    ) -> Result<Vec<T>, CmsError> {
        #[derive(Deserialize)]
        struct Nodes<T> {
            nodes: Option<Vec<T>>,
        }

        let conn: Option<Nodes<T>> = self.fetch(operation, json!({ "first": first }), None).await?;
        Ok(conn.and_then(|c| c.nodes).unwrap_or_default())
    }

    /// Existence and content-type probe.
    pub async fn content_info(
        &self,
        id: &str,
        id_type: IdType,
        as_preview: bool,
        auth_token: Option<&str>,
    ) -> Result<Option<ContentInfo>, CmsError> {
        self.fetch_single(&queries::CONTENT_INFO, id, id_type, as_preview, auth_token)
            .await
    }

    pub async fn page(
        &self,
        id: &str,
        id_type: IdType,
        as_preview: bool,
        auth_token: Option<&str>,
    ) -> Result<Option<Page>, CmsError> {
        self.fetch_single(&queries::PAGE_BY_ID, id, id_type, as_preview, auth_token)
            .await
    }

    pub async fn post(
        &self,
        id: &str,
        id_type: IdType,
        as_preview: bool,
        auth_token: Option<&str>,
    ) -> Result<Option<Post>, CmsError> {
        self.fetch_single(&queries::POST_BY_ID, id, id_type, as_preview, auth_token)
            .await
    }

    pub async fn job(
        &self,
        id: &str,
        id_type: IdType,
        as_preview: bool,
        auth_token: Option<&str>,
    ) -> Result<Option<Job>, CmsError> {
        self.fetch_single(&queries::JOB_BY_ID, id, id_type, as_preview, auth_token)
            .await
    }

    pub async fn case_study(
        &self,
        id: &str,
        id_type: IdType,
        as_preview: bool,
        auth_token: Option<&str>,
    ) -> Result<Option<CaseStudy>, CmsError> {
        self.fetch_single(&queries::CASE_STUDY_BY_ID, id, id_type, as_preview, auth_token)
            .await
    }

    pub async fn post_archive(&self, first: u32) -> Result<Vec<Post>, CmsError> {
        self.fetch_archive(&queries::POST_ARCHIVE, first).await
    }

    pub async fn job_archive(&self, first: u32) -> Result<Vec<Job>, CmsError> {
        self.fetch_archive(&queries::JOB_ARCHIVE, first).await
    }

    pub async fn case_study_archive(&self, first: u32) -> Result<Vec<CaseStudy>, CmsError> {
        self.fetch_archive(&queries::CASE_STUDY_ARCHIVE, first).await
    }

    /// Logs in and returns the auth token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, CmsError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct LoginPayload {
            auth_token: Option<String>,
        }

        let variables = json!({ "username": username, "password": password });
        let payload: Option<LoginPayload> =
            self.fetch(&queries::LOGIN_USER, variables, None).await?;

        payload
            .and_then(|p| p.auth_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CmsError::malformed(queries::LOGIN_USER.name, "login returned no authToken"))
    }

    /// Looks a node up by database id with an authenticated request.
    pub async fn preview_node(
        &self,
        id: &str,
        auth_token: &str,
    ) -> Result<Option<ContentInfo>, CmsError> {
        self.fetch(
            &queries::PREVIEW_CONTENT_NODE,
            json!({ "id": id }),
            Some(auth_token),
        )
        .await
    }
}

//! HTTP front end.
//!
//! Serves resolved content as JSON view models for the presentation layer.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/`, `/{*path}` | Catch-all content route |
//! | `GET`  | `/blog`, `/job`, `/case-study` | Published archive listings |
//! | `GET`  | `/blog/{slug}`, `/job/{slug}`, `/case-study/{slug}` | Single item by slug |
//! | `GET`  | `/api/preview?secret=&id=` | Preview activation (307 redirect) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "cms_unavailable", "message": "CMS request failed: ..." } }
//! ```
//!
//! Error codes: `not_found` (404), `unauthorized` (401),
//! `cms_unavailable` (502), `config_missing` (500).
//!
//! A path the CMS does not know is answered with the `not_found` resolution
//! body and status 404, not with the error envelope.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cms::{CmsClient, ContentApi, HttpCmsClient};
use crate::config::Config;
use crate::error::CmsError;
use crate::preview::{activate_preview, PreviewError, SESSION_COOKIE};
use crate::resolver::{Resolution, Resolver, SlugRoute};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    api: ContentApi,
    resolver: Resolver,
}

/// Starts the HTTP server against the configured GraphQL endpoint.
///
/// Binds to the address configured in `[server].bind`, builds an
/// [`HttpCmsClient`] from `[cms]` and serves every route listed in the module
/// docs. The server runs until the process is terminated.
///
/// This is the entry point used by `hpress serve`. To serve against another
/// transport (a cache, a fixture), use [`run_server_with_client`].
///
/// # Arguments
///
/// - `config`: validated configuration (origins, GraphQL endpoint, preview
///   secret, bind address).
///
/// # Returns
///
/// `Ok(())` when the server shuts down, or an error if the HTTP client cannot
/// be built or the address cannot be bound.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let client = HttpCmsClient::new(&config.cms)?;
    run_server_with_client(config, Arc::new(client)).await
}

/// Starts the HTTP server with a caller-supplied CMS client.
///
/// Like [`run_server`], but every GraphQL operation goes through `client`.
///
/// # Example
///
/// ```rust,no_run
/// use headless_press::cms::HttpCmsClient;
/// use headless_press::server::run_server_with_client;
/// use std::sync::Arc;
///
/// # async fn example(config: &headless_press::config::Config) -> anyhow::Result<()> {
/// let client = HttpCmsClient::new(&config.cms)?;
/// run_server_with_client(config, Arc::new(client)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_client(
    config: &Config,
    client: Arc<dyn CmsClient>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config, client);

    let rewriter = config.rewriter();
    info!(
        bind = %bind_addr,
        frontend = rewriter.frontend_origin().as_deref().unwrap_or("-"),
        backend = config.backend_origin().as_deref().unwrap_or("-"),
        "server listening"
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router.
///
/// Preview reads authenticate only with the visitor's `wp_jwt` cookie; the
/// configured preview credentials are used by `/api/preview` alone.
pub fn router(config: &Config, client: Arc<dyn CmsClient>) -> Router {
    let api = ContentApi::new(client);
    let resolver = Resolver::new(api.clone(), config.rewriter());

    let state = AppState {
        config: Arc::new(config.clone()),
        api,
        resolver,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/preview", get(handle_preview))
        .route("/blog", get(handle_post_archive))
        .route("/job", get(handle_job_archive))
        .route("/case-study", get(handle_case_study_archive))
        .route("/blog/{slug}", get(handle_post))
        .route("/job/{slug}", get(handle_job))
        .route("/case-study/{slug}", get(handle_case_study))
        .route("/", get(handle_root))
        .route("/{*path}", get(handle_path))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<CmsError> for AppError {
    fn from(err: CmsError) -> Self {
        error!(error = %err, "CMS request failed");
        AppError::new(StatusCode::BAD_GATEWAY, "cms_unavailable", err.to_string())
    }
}

impl From<PreviewError> for AppError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::ConfigMissing(_) => {
                error!(error = %err, "preview misconfigured");
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "config_missing", err.to_string())
            }
            PreviewError::Unauthorized | PreviewError::InvalidId => {
                AppError::new(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
            }
            PreviewError::Cms(cms) => cms.into(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Content routes ============

fn resolution_response(resolution: Resolution) -> Response {
    match resolution {
        Resolution::NotFound => (StatusCode::NOT_FOUND, Json(resolution)).into_response(),
        other => Json(other).into_response(),
    }
}

/// Extracts the preview session token from the `Cookie` header.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

async fn handle_root(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let resolution = state
        .resolver
        .resolve("/", session_token(&headers).as_deref())
        .await?;
    Ok(resolution_response(resolution))
}

async fn handle_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = format!("/{}", path.trim_matches('/'));
    let resolution = state
        .resolver
        .resolve(&path, session_token(&headers).as_deref())
        .await?;
    Ok(resolution_response(resolution))
}

async fn single(state: &AppState, route: SlugRoute, slug: &str) -> Result<Response, AppError> {
    let resolution = state.resolver.resolve_slug(route, slug).await?;
    Ok(resolution_response(resolution))
}

async fn handle_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    single(&state, SlugRoute::Post, &slug).await
}

async fn handle_job(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    single(&state, SlugRoute::Job, &slug).await
}

async fn handle_case_study(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    single(&state, SlugRoute::CaseStudy, &slug).await
}

// ============ Archives ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveResponse<T> {
    content_type: &'static str,
    items: Vec<T>,
}

async fn handle_post_archive(
    State(state): State<AppState>,
) -> Result<Json<ArchiveResponse<crate::models::Post>>, AppError> {
    let items = state.api.post_archive(state.config.cms.archive_page_size).await?;
    Ok(Json(ArchiveResponse {
        content_type: "post",
        items,
    }))
}

async fn handle_job_archive(
    State(state): State<AppState>,
) -> Result<Json<ArchiveResponse<crate::models::Job>>, AppError> {
    let items = state.api.job_archive(state.config.cms.archive_page_size).await?;
    Ok(Json(ArchiveResponse {
        content_type: "job",
        items,
    }))
}

async fn handle_case_study_archive(
    State(state): State<AppState>,
) -> Result<Json<ArchiveResponse<crate::models::CaseStudy>>, AppError> {
    let items = state
        .api
        .case_study_archive(state.config.cms.archive_page_size)
        .await?;
    Ok(Json(ArchiveResponse {
        content_type: "caseStudy",
        items,
    }))
}

// ============ GET /api/preview ============

#[derive(Deserialize)]
struct PreviewParams {
    secret: Option<String>,
    id: Option<String>,
}

async fn handle_preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<Response, AppError> {
    let redirect = activate_preview(
        &state.api,
        &state.config,
        params.secret.as_deref(),
        params.id.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::TEMPORARY_REDIRECT,
        [
            (header::LOCATION, redirect.location.clone()),
            (header::SET_COOKIE, redirect.set_cookie()),
        ],
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; wp_jwt=abc.def; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_session_token_absent() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("wp_jwt="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_preview_errors_map_to_status() {
        let e: AppError = PreviewError::Unauthorized.into();
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);
        assert_eq!(e.message, "Invalid token");

        let e: AppError = PreviewError::ConfigMissing("preview.secret").into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "config_missing");

        let e: AppError = PreviewError::Cms(CmsError::malformed("LoginUser", "x")).into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
    }
}

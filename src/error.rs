//! Errors surfaced by the CMS transport.
//!
//! Only transport-level failures are errors. A missing node is a normal
//! outcome (`Option::None` / `Resolution::NotFound`), and malformed SEO
//! payloads degrade silently.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("CMS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The CMS answered with a non-2xx status.
    #[error("CMS returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried a GraphQL `errors` array.
    #[error("GraphQL errors in {operation}: {}", .messages.join("; "))]
    GraphQl {
        operation: String,
        messages: Vec<String>,
    },

    /// The response was not the shape the operation expects.
    #[error("malformed response for {operation}: {reason}")]
    Malformed { operation: String, reason: String },
}

impl CmsError {
    pub fn malformed(operation: &str, reason: impl Into<String>) -> Self {
        CmsError::Malformed {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

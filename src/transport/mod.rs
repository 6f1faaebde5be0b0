//! # Transport Boundary
//!
//! The crate never talks HTTP itself. Every request goes through the
//! [`Transport`] trait, which takes a fully described [`Request`] and answers
//! with the decoded JSON body or a [`TransportFailure`] carrying the raw
//! response body (so failures can be reparsed as hypermedia error payloads).
//!
//! See the [`mock`] module for the in-memory implementation used in tests.

pub mod mock;

use async_trait::async_trait;
use serde_json::Value;

/// Default method for requests that do not declare one.
pub const DEFAULT_METHOD: &str = "GET";

/// Default content type for action requests that do not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    /// A plain `GET` with no body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: DEFAULT_METHOD.to_owned(),
            url: url.into(),
            content_type: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// A failed request, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status {status:?}: {body}")]
pub struct TransportFailure {
    /// HTTP status, when a response was received at all.
    pub status: Option<u16>,
    /// Raw response body text.
    pub body: String,
}

impl TransportFailure {
    pub fn new(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A failure with an HTTP status and response body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::new(Some(status), body)
    }
}

/// The HTTP collaborator.
///
/// Implementations own timeouts, retries and body encoding (the request's
/// `content_type` says how `body` should go on the wire).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<Value, TransportFailure>;
}

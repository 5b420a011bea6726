//! Status-carrying errors.
//!
//! [`Status`] is what backend methods, interceptors and middleware return on
//! failure. It may carry an explicit HTTP status and a structured payload
//! that is sent to the client instead of the plain-text message.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::message::AnyMessage;

/// Error returned from a method invocation.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use protoweb_core::Status;
///
/// let status = Status::not_found("user not found");
/// assert_eq!(status.http_status(), StatusCode::NOT_FOUND);
/// assert_eq!(status.message(), "user not found");
///
/// // Without an explicit status the error maps to 500.
/// let status = Status::plain("No name");
/// assert_eq!(status.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert!(status.explicit_status().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct Status {
    status: Option<StatusCode>,
    message: String,
    payload: Option<Arc<dyn AnyMessage>>,
}

impl Status {
    /// Create a status with an explicit HTTP status code.
    ///
    /// An empty message is replaced by the status's canonical reason phrase.
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = status.canonical_reason().unwrap_or_default().to_owned();
        }
        Self {
            status: Some(status),
            message,
            payload: None,
        }
    }

    /// Create an error without an explicit status. It is reported as 500.
    pub fn plain<S: Into<String>>(message: S) -> Self {
        Self {
            status: None,
            message: message.into(),
            payload: None,
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn payload_too_large<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    /// Attach a structured payload, encoded in the request's format when the
    /// error is written.
    pub fn with_payload<M: AnyMessage>(mut self, payload: M) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// The explicitly set HTTP status, if any.
    pub fn explicit_status(&self) -> Option<StatusCode> {
        self.status
    }

    /// HTTP status to respond with: the explicit one, or 500.
    pub fn http_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> Option<&dyn AnyMessage> {
        self.payload.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Status {}

impl From<anyhow::Error> for Status {
    fn from(err: anyhow::Error) -> Self {
        Status::plain(err.to_string())
    }
}

//! Per-call context handed to interceptors, middleware and backend methods.

pub(crate) mod config;
pub mod timeout;

use std::time::Duration;

use http::{Extensions, HeaderMap};
use tokio::time::Instant;

pub(crate) use config::ServerConfig;
pub use timeout::{RPC_TIMEOUT_MS_HEADER, client_timeout, effective_timeout, parse_millis};

/// Request-scoped values for one method call.
///
/// Created by the dispatcher for every request and dropped once the
/// response is written. Interceptors receive it by reference, middleware and
/// backend methods by value.
///
/// The deadline is informational: the dispatcher never cancels a call.
/// Backends that want to enforce it can use [`tokio::time::timeout_at`].
#[derive(Clone, Debug)]
pub struct CallContext {
    method: String,
    format: String,
    headers: HeaderMap,
    extensions: Extensions,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a context for `method` with the default format and no deadline.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            format: protoweb_core::WireFormat::default().as_str().to_owned(),
            headers: HeaderMap::new(),
            extensions: Extensions::new(),
            deadline: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the deadline to `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Some(Instant::now() + timeout))
    }

    /// Name of the method being called, as registered.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Format token resolved for this call (`json`, `binary`, `text`, ...).
    ///
    /// The same token is used to decode the request and encode the response.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Extensions of the HTTP request, e.g. values inserted by axum layers.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. Zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

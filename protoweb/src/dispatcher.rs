//! Name-based dispatch of HTTP requests to registered methods.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::response::Response;
use http::Request;
use protoweb_core::Status;

use crate::context::ServerConfig;
use crate::method::MethodDescriptor;
use crate::request::{PendingRequest, RequestEnvelope};
use crate::response;

/// Routes requests to the method named by the `method` parameter.
///
/// Cheap to clone; the method table is shared and never changes after
/// [`ServiceBuilder::build`](crate::ServiceBuilder::build).
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    methods: HashMap<String, Arc<MethodDescriptor>>,
    config: ServerConfig,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("methods", &self.method_names())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Dispatcher {
    pub(crate) fn new(methods: HashMap<String, Arc<MethodDescriptor>>, config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner { methods, config }),
        }
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn method(&self, name: &str) -> Option<&Arc<MethodDescriptor>> {
        self.inner.methods.get(name)
    }

    pub(crate) fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Serve an HTTP request naming its method with the `method` parameter.
    pub async fn serve(&self, req: Request<Body>) -> Response {
        self.serve_method(req, None).await
    }

    /// Serve an HTTP request. `method` overrides the `method` parameter.
    pub(crate) async fn serve_method(&self, req: Request<Body>, method: Option<&str>) -> Response {
        let config = self.config();

        let pending = match PendingRequest::from_request(req, &config.limits).await {
            Ok(pending) => pending,
            Err(status) => return fail("", "", &status, None),
        };

        let method = match method.or(pending.params.method.as_deref()) {
            Some(method) if !method.is_empty() => method.to_owned(),
            _ => return fail("", "", &Status::bad_request("No method parameter"), None),
        };

        let Some(descriptor) = self.method(&method).cloned() else {
            return fail(&method, "", &Status::not_found("Method not found"), None);
        };

        let format = match pending.params.format.as_deref() {
            Some(format) if !format.is_empty() => format.to_owned(),
            _ => config.default_format.as_str().to_owned(),
        };

        match pending.into_envelope(&method, &format, config).await {
            Ok(envelope) => invoke(&descriptor, envelope).await,
            Err(status) => fail(&method, &format, &status, Some(&*descriptor)),
        }
    }

    /// Dispatch an already extracted request.
    ///
    /// The method and format are taken from the envelope's context.
    pub async fn dispatch(&self, envelope: RequestEnvelope) -> Response {
        let method = envelope.context.method();
        match self.method(method) {
            Some(descriptor) => invoke(descriptor, envelope).await,
            None => fail(
                method,
                envelope.context.format(),
                &Status::not_found("Method not found"),
                None,
            ),
        }
    }
}

async fn invoke(descriptor: &MethodDescriptor, envelope: RequestEnvelope) -> Response {
    let RequestEnvelope { context, payload } = envelope;
    let method = descriptor.name();
    let format = context.format().to_owned();

    tracing::debug!(method, format = %format, size = payload.len(), "dispatching request");

    match descriptor.invoke(context, &payload).await {
        Ok(encoded) => response::success(encoded),
        Err(status) => fail(method, &format, &status, Some(descriptor)),
    }
}

fn fail(
    method: &str,
    format: &str,
    status: &Status,
    descriptor: Option<&MethodDescriptor>,
) -> Response {
    let code = status.http_status();
    if code.is_server_error() {
        tracing::error!(method, format, status = code.as_u16(), error = %status, "request failed");
    } else {
        tracing::debug!(method, format, status = code.as_u16(), error = %status, "request rejected");
    }

    response::error(status, descriptor.map(MethodDescriptor::codec), format)
}

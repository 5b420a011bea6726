//! axum routers for a [`Dispatcher`].
//!
//! Two routing modes are supported:
//! - a single endpoint where the `method` parameter names the operation
//!   ([`Dispatcher::into_router`])
//! - one path per operation, `FooBar` served at `/foo_bar`
//!   ([`Dispatcher::into_path_router`])
//!
//! All HTTP methods are accepted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::routing::{MethodRouter, any};
use protoweb_core::{AnyMessage, Status};

use crate::context::CallContext;
use crate::dispatcher::Dispatcher;
use crate::service::ServiceBuilder;

impl Dispatcher {
    /// Serve every method at `path`, selected by the `method` parameter.
    pub fn into_router<S>(self, path: &str) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new().route(
            path,
            any(move |req: Request| {
                let dispatcher = self.clone();
                async move { dispatcher.serve(req).await }
            }),
        )
    }

    /// Serve each method at `/<snake_case_name>`.
    ///
    /// # Panics
    ///
    /// Panics if two method names map to the same path.
    pub fn into_path_router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut paths: HashMap<String, &str> = HashMap::new();
        let mut router = Router::new();
        for name in self.method_names() {
            let path = format!("/{}", snake_case(name));
            if let Some(other) = paths.insert(path.clone(), name) {
                panic!("methods `{other}` and `{name}` both map to `{path}`");
            }
            router = router.route(&path, self.method_router(name));
        }
        router
    }

    /// Serve the single method `name`, ignoring any `method` parameter.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not registered.
    pub fn method_router<S>(&self, name: &str) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        assert!(self.method(name).is_some(), "method `{name}` is not registered");
        let dispatcher = self.clone();
        let name: Arc<str> = Arc::from(name);
        any(move |req: Request| {
            let dispatcher = dispatcher.clone();
            let name = name.clone();
            async move { dispatcher.serve_method(req, Some(&*name)).await }
        })
    }
}

/// Serve `f` directly as an axum handler, without a `method` parameter.
///
/// `name` is what [`CallContext::method`] reports.
///
/// ```ignore
/// let app = Router::new().route("/hello", protoweb::proxy("Hello", hello));
/// ```
pub fn proxy<S, Req, Res, F, Fut>(name: &str, f: F) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
    Req: AnyMessage + Default,
    Res: AnyMessage + Default,
    F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, Status>> + Send + 'static,
{
    ServiceBuilder::new()
        .method(name, f)
        .build()
        .method_router(name)
}

/// `FooBar` -> `foo_bar`: an underscore before every uppercase letter except
/// a leading one, then lowercase.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

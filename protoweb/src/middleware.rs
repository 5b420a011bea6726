//! Wrapping middleware around the backend invocation.
//!
//! A middleware receives the downstream [`Handler`] and returns a replacement.
//! It can log before and after the call, mutate the request or response, or
//! abort by returning an error or a canned response without calling `next`.
//!
//! Middleware wraps only the backend method. Request interceptors run
//! before the outermost middleware and response interceptors after it.
//!
//! # Example
//!
//! ```ignore
//! use protoweb::{FnMiddleware, ServiceBuilder};
//!
//! let logging = FnMiddleware::new(|ctx, req, next| {
//!     Box::pin(async move {
//!         tracing::info!(method = ctx.method(), "calling");
//!         let result = next.call(ctx, req).await;
//!         tracing::info!(ok = result.is_ok(), "done");
//!         result
//!     })
//! });
//!
//! let dispatcher = ServiceBuilder::new().middleware(logging).build();
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use protoweb_core::{AnyMessage, Status};

use crate::context::CallContext;

/// Result of a method invocation.
pub type HandlerResult = Result<Box<dyn AnyMessage>, Status>;

/// The type-erased signature of a method invocation.
///
/// Middleware wraps this function to add logic before and after the call.
pub type Handler =
    Arc<dyn Fn(CallContext, Box<dyn AnyMessage>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// The next middleware or the backend method.
#[derive(Clone)]
pub struct Next {
    inner: Handler,
}

impl Next {
    pub(crate) fn new(inner: Handler) -> Self {
        Self { inner }
    }

    /// Call the next middleware or the backend method.
    pub async fn call(self, ctx: CallContext, request: Box<dyn AnyMessage>) -> HandlerResult {
        (self.inner)(ctx, request).await
    }
}

/// Wraps method invocations.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: Handler) -> Handler;
}

/// A middleware built from a closure receiving the call and [`Next`].
pub struct FnMiddleware<F> {
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(CallContext, Box<dyn AnyMessage>, Next) -> BoxFuture<'static, HandlerResult>
        + Send
        + Sync
        + Clone
        + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(CallContext, Box<dyn AnyMessage>, Next) -> BoxFuture<'static, HandlerResult>
        + Send
        + Sync
        + Clone
        + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        let func = self.func.clone();
        Arc::new(move |ctx, request| func(ctx, request, Next::new(next.clone())))
    }
}

impl<F: Clone> Clone for FnMiddleware<F> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
        }
    }
}

/// Middleware applied in order: the first one added is the outermost.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("count", &self.layers.len())
            .finish()
    }
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.layers.push(middleware);
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Wrap `handler` with every middleware in the stack.
    pub fn apply(&self, handler: Handler) -> Handler {
        let mut wrapped = handler;
        // reverse so the first middleware sees the call first
        for middleware in self.layers.iter().rev() {
            wrapped = middleware.wrap(wrapped);
        }
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{HelloRequest, HelloResponse, request, response};
    use futures::FutureExt;
    use std::sync::Mutex;

    fn echo() -> Handler {
        Arc::new(|_ctx: CallContext, req: Box<dyn AnyMessage>| {
            async move {
                let name = req
                    .downcast_ref::<HelloRequest>()
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                Ok::<_, Status>(Box::new(response(&format!("Hello {name}"))) as Box<dyn AnyMessage>)
            }
            .boxed()
        })
    }

    fn recorder(log: Arc<Mutex<Vec<String>>>, id: &'static str) -> impl Middleware {
        FnMiddleware::new(move |ctx, req, next: Next| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(format!("{id} before"));
                let result = next.call(ctx, req).await;
                log.lock().unwrap().push(format!("{id} after"));
                result
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_empty_stack_is_identity() {
        let stack = MiddlewareStack::new();
        assert!(stack.is_empty());

        let handler = stack.apply(echo());
        let res = handler(CallContext::new("Hello"), Box::new(request("World")))
            .await
            .unwrap();
        assert_eq!(res.downcast_ref::<HelloResponse>(), Some(&response("Hello World")));
    }

    #[tokio::test]
    async fn test_first_middleware_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut stack = MiddlewareStack::new();
        stack.push(Arc::new(recorder(log.clone(), "first")));
        stack.push(Arc::new(recorder(log.clone(), "second")));
        assert_eq!(stack.len(), 2);

        let handler = stack.apply(echo());
        handler(CallContext::new("Hello"), Box::new(request("World")))
            .await
            .unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first before", "second before", "second after", "first after"]
        );
    }

    #[tokio::test]
    async fn test_middleware_mutates_request_and_response() {
        let mutate = FnMiddleware::new(|ctx, mut req: Box<dyn AnyMessage>, next: Next| {
            async move {
                if let Some(r) = req.downcast_mut::<HelloRequest>() {
                    r.name = r.name.to_uppercase();
                }
                let mut res = next.call(ctx, req).await?;
                if let Some(r) = res.downcast_mut::<HelloResponse>() {
                    r.message.push('!');
                }
                Ok(res)
            }
            .boxed()
        });

        let handler = mutate.wrap(echo());
        let res = handler(CallContext::new("Hello"), Box::new(request("World")))
            .await
            .unwrap();
        assert_eq!(res.downcast_ref::<HelloResponse>(), Some(&response("Hello WORLD!")));
    }

    #[tokio::test]
    async fn test_middleware_aborts_without_next() {
        let called = Arc::new(Mutex::new(false));
        let flag = called.clone();
        let inner: Handler = Arc::new(move |_ctx: CallContext, _req: Box<dyn AnyMessage>| {
            *flag.lock().unwrap() = true;
            async { Ok::<_, Status>(Box::new(response("unreachable")) as Box<dyn AnyMessage>) }.boxed()
        });

        let deny = FnMiddleware::new(|_ctx, _req, _next: Next| {
            async { Err(Status::forbidden("")) }.boxed()
        });

        let err = deny
            .wrap(inner)(CallContext::new("Hello"), Box::new(request("World")))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Forbidden");
        assert!(!*called.lock().unwrap());
    }
}

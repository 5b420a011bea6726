//! Request and response interceptors.
//!
//! Interceptors run synchronously around every method call of a dispatcher:
//! - [`RequestInterceptor`]s see the decoded request before the backend runs.
//!   Returning a response or an error stops the chain and skips the backend.
//! - [`ResponseInterceptor`]s see the response before it is encoded.
//!   Returning an error stops the chain and skips encoding.
//!
//! Closures with the matching signature implement both traits.
//!
//! # Example
//!
//! ```ignore
//! use protoweb::{AnyMessage, CallContext, RequestOutcome, ServiceBuilder, Status};
//!
//! let dispatcher = ServiceBuilder::new()
//!     .request_interceptor(|ctx: &CallContext, _req: &mut dyn AnyMessage| -> RequestOutcome {
//!         if ctx.headers().contains_key("authorization") {
//!             Ok(None)
//!         } else {
//!             Err(Status::unauthorized(""))
//!         }
//!     })
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;

use protoweb_core::{AnyMessage, Status};

use crate::context::CallContext;

/// Result of a [`RequestInterceptor`]: `Some` short-circuits with a response.
pub type RequestOutcome = Result<Option<Box<dyn AnyMessage>>, Status>;

/// Runs before the backend method.
pub trait RequestInterceptor: Send + Sync + 'static {
    /// Inspect or modify the decoded request.
    ///
    /// - `Ok(None)`: continue with the next interceptor.
    /// - `Ok(Some(response))`: stop and use `response` as the method's result.
    /// - `Err(status)`: stop and fail the call.
    fn intercept(&self, ctx: &CallContext, request: &mut dyn AnyMessage) -> RequestOutcome;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&CallContext, &mut dyn AnyMessage) -> RequestOutcome + Send + Sync + 'static,
{
    fn intercept(&self, ctx: &CallContext, request: &mut dyn AnyMessage) -> RequestOutcome {
        self(ctx, request)
    }
}

/// Runs after the backend method, before encoding.
pub trait ResponseInterceptor: Send + Sync + 'static {
    /// Inspect or modify the response. An error stops the chain.
    fn intercept(&self, ctx: &CallContext, response: &mut dyn AnyMessage) -> Result<(), Status>;
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&CallContext, &mut dyn AnyMessage) -> Result<(), Status> + Send + Sync + 'static,
{
    fn intercept(&self, ctx: &CallContext, response: &mut dyn AnyMessage) -> Result<(), Status> {
        self(ctx, response)
    }
}

/// Ordered request and response interceptors, shared by all methods of a
/// dispatcher.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request.push(interceptor);
    }

    pub fn push_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response.push(interceptor);
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    /// Run request interceptors in registration order until one returns a
    /// response or an error.
    pub fn run_request(&self, ctx: &CallContext, request: &mut dyn AnyMessage) -> RequestOutcome {
        for interceptor in &self.request {
            if let Some(response) = interceptor.intercept(ctx, request)? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Run response interceptors in registration order until one fails.
    pub fn run_response(
        &self,
        ctx: &CallContext,
        response: &mut dyn AnyMessage,
    ) -> Result<(), Status> {
        for interceptor in &self.response {
            interceptor.intercept(ctx, response)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{HelloRequest, HelloResponse, request, response};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> CallContext {
        CallContext::new("Hello")
    }

    #[test]
    fn test_interceptor_chain_empty() {
        let chain = InterceptorChain::new();
        assert!(chain.is_empty());

        let mut req = request("World");
        assert!(chain.run_request(&ctx(), &mut req).unwrap().is_none());
        assert_eq!(req, request("World"));
    }

    #[test]
    fn test_request_interceptors_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = InterceptorChain::new();
        for id in 1..=3 {
            let seen = seen.clone();
            chain.push_request(Arc::new(
                move |_: &CallContext, req: &mut dyn AnyMessage| -> RequestOutcome {
                    seen.lock().unwrap().push(id);
                    req.downcast_mut::<HelloRequest>().unwrap().name.push('!');
                    Ok(None)
                },
            ));
        }

        let mut req = request("World");
        assert!(chain.run_request(&ctx(), &mut req).unwrap().is_none());
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(req.name, "World!!!");
    }

    #[test]
    fn test_request_short_circuit_stops_chain() {
        let later = Arc::new(AtomicUsize::new(0));
        let mut chain = InterceptorChain::new();
        chain.push_request(Arc::new(|_: &CallContext, _: &mut dyn AnyMessage| -> RequestOutcome {
            Ok(Some(Box::new(response("cached")) as Box<dyn AnyMessage>))
        }));
        let counter = later.clone();
        chain.push_request(Arc::new(move |_: &CallContext, _: &mut dyn AnyMessage| -> RequestOutcome {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }));

        let result = chain.run_request(&ctx(), &mut request("World")).unwrap();
        let res = result.unwrap();
        assert_eq!(res.downcast_ref::<HelloResponse>(), Some(&response("cached")));
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_request_error_stops_chain() {
        let later = Arc::new(AtomicUsize::new(0));
        let mut chain = InterceptorChain::new();
        chain.push_request(Arc::new(|_: &CallContext, _: &mut dyn AnyMessage| -> RequestOutcome {
            Err(Status::unauthorized(""))
        }));
        let counter = later.clone();
        chain.push_request(Arc::new(move |_: &CallContext, _: &mut dyn AnyMessage| -> RequestOutcome {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }));

        let err = chain.run_request(&ctx(), &mut request("World")).unwrap_err();
        assert_eq!(err.message(), "Unauthorized");
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_response_error_stops_chain() {
        let later = Arc::new(AtomicUsize::new(0));
        let mut chain = InterceptorChain::new();
        chain.push_response(Arc::new(|_: &CallContext, res: &mut dyn AnyMessage| -> Result<(), Status> {
            res.downcast_mut::<HelloResponse>().unwrap().message = "rewritten".to_owned();
            Ok(())
        }));
        chain.push_response(Arc::new(|_: &CallContext, _: &mut dyn AnyMessage| -> Result<(), Status> {
            Err(Status::forbidden("hidden"))
        }));
        let counter = later.clone();
        chain.push_response(Arc::new(move |_: &CallContext, _: &mut dyn AnyMessage| -> Result<(), Status> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let mut res = response("Hello World");
        let err = chain.run_response(&ctx(), &mut res).unwrap_err();
        assert_eq!(err.message(), "hidden");
        assert_eq!(res.message, "rewritten");
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_interceptor_chain_debug() {
        let mut chain = InterceptorChain::new();
        chain.push_response(Arc::new(
            |_: &CallContext, _: &mut dyn AnyMessage| -> Result<(), Status> { Ok(()) },
        ));
        let debug_str = format!("{:?}", chain);
        assert!(debug_str.contains("InterceptorChain"));
        assert!(debug_str.contains("response: 1"));
    }
}

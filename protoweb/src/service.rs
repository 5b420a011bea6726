//! Method registration.
//!
//! Methods are registered explicitly, by name, with [`ServiceBuilder`]. Any
//! `Fn(CallContext, Req) -> impl Future<Output = Result<Res, Status>>` can be
//! registered, where `Req` and `Res` are protobuf messages; other shapes do
//! not compile.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use protoweb::{CallContext, ServiceBuilder, Status, WireFormat};
//!
//! async fn hello(_ctx: CallContext, req: HelloRequest) -> Result<HelloResponse, Status> {
//!     Ok(HelloResponse { message: format!("Hello {}", req.name) })
//! }
//!
//! let router = ServiceBuilder::new()
//!     .default_format(WireFormat::Json)
//!     .timeout(Duration::from_secs(10))
//!     .method("Hello", hello)
//!     .build()
//!     .into_router("/rpc");
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use protoweb_core::{AnyMessage, BoxedCodec, MessageCodec, Status, WireFormat};

use crate::context::{CallContext, ServerConfig};
use crate::dispatcher::Dispatcher;
use crate::interceptor::{InterceptorChain, RequestInterceptor, ResponseInterceptor};
use crate::limits::MessageLimits;
use crate::method::{MethodDescriptor, MethodEntry};
use crate::middleware::{Middleware, MiddlewareStack};

/// A backend type exposing several operations.
///
/// Usually implemented with [`register_methods!`](crate::register_methods).
pub trait ServiceDefinition: Send + Sync + 'static {
    /// Register every exposed operation of the service.
    fn register(self: Arc<Self>, builder: ServiceBuilder) -> ServiceBuilder;
}

/// Builder for a [`Dispatcher`].
///
/// Codec, interceptors and middleware apply to every method, whatever the
/// order of the builder calls.
pub struct ServiceBuilder {
    methods: Vec<MethodEntry>,
    codec: BoxedCodec,
    config: ServerConfig,
    interceptors: InterceptorChain,
    middleware: MiddlewareStack,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
            codec: BoxedCodec::default(),
            config: ServerConfig::default(),
            interceptors: InterceptorChain::new(),
            middleware: MiddlewareStack::new(),
        }
    }

    /// Register `f` under `name`.
    ///
    /// The name is the externally visible identifier, used verbatim.
    pub fn method<Req, Res, F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        Req: AnyMessage + Default,
        Res: AnyMessage + Default,
        F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, Status>> + Send + 'static,
    {
        self.methods.push(MethodEntry::new(name, f));
        self
    }

    /// Register all operations of `service`.
    pub fn service<S: ServiceDefinition>(self, service: S) -> Self {
        Arc::new(service).register(self)
    }

    /// Like [`service`](Self::service), for a service that is shared elsewhere.
    pub fn shared_service<S: ServiceDefinition>(self, service: Arc<S>) -> Self {
        service.register(self)
    }

    /// Format used when a request has no `format` parameter. Default is JSON.
    pub fn default_format(mut self, format: WireFormat) -> Self {
        self.config.default_format = format;
        self
    }

    /// Codec for requests, responses and error payloads.
    ///
    /// Default is [`ProtoCodec`](protoweb_core::ProtoCodec) with default options.
    pub fn codec<C: MessageCodec>(mut self, codec: C) -> Self {
        self.codec = BoxedCodec::new(codec);
        self
    }

    /// Set custom request size limits.
    ///
    /// Default is 4 MB.
    pub fn message_limits(mut self, limits: MessageLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Server-side deadline for every call.
    ///
    /// Clients can shorten it with the `Rpc-Timeout-Ms` header. The deadline
    /// is exposed through [`CallContext`]; the dispatcher does not cancel
    /// calls itself.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.server_timeout = Some(timeout);
        self
    }

    pub fn request_interceptor<I: RequestInterceptor>(mut self, interceptor: I) -> Self {
        self.interceptors.push_request(Arc::new(interceptor));
        self
    }

    pub fn response_interceptor<I: ResponseInterceptor>(mut self, interceptor: I) -> Self {
        self.interceptors.push_response(Arc::new(interceptor));
        self
    }

    /// Add a middleware. The first one added is the outermost.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Build the dispatcher.
    ///
    /// # Panics
    ///
    /// Panics if a method name is empty or registered twice.
    pub fn build(self) -> Dispatcher {
        let interceptors = Arc::new(self.interceptors);
        let mut methods = HashMap::with_capacity(self.methods.len());

        for mut entry in self.methods {
            assert!(!entry.name.is_empty(), "method name must not be empty");
            if methods.contains_key(&entry.name) {
                panic!("method `{}` is registered more than once", entry.name);
            }
            entry.handler = self.middleware.apply(entry.handler);
            let name = entry.name.clone();
            let descriptor = MethodDescriptor::new(entry, self.codec.clone(), interceptors.clone());
            methods.insert(name, Arc::new(descriptor));
        }

        Dispatcher::new(methods, self.config)
    }
}

/// Implement [`ServiceDefinition`] for a type from `"Name" => method` pairs.
///
/// Each method must look like
/// `async fn method(&self, ctx: CallContext, req: Req) -> Result<Res, Status>`.
///
/// # Example
///
/// ```ignore
/// struct Greeter;
///
/// impl Greeter {
///     async fn hello(&self, _ctx: CallContext, req: HelloRequest) -> Result<HelloResponse, Status> {
///         Ok(HelloResponse { message: format!("Hello {}", req.name) })
///     }
/// }
///
/// protoweb::register_methods!(Greeter {
///     "Hello" => hello,
/// });
///
/// let dispatcher = ServiceBuilder::new().service(Greeter).build();
/// ```
#[macro_export]
macro_rules! register_methods {
    ($service:ty { $($name:literal => $method:ident),* $(,)? }) => {
        impl $crate::ServiceDefinition for $service {
            fn register(
                self: ::std::sync::Arc<Self>,
                builder: $crate::ServiceBuilder,
            ) -> $crate::ServiceBuilder {
                builder
                $(
                    .method($name, {
                        let service = ::std::sync::Arc::clone(&self);
                        move |ctx, req| {
                            let service = ::std::sync::Arc::clone(&service);
                            async move { service.$method(ctx, req).await }
                        }
                    })
                )*
            }
        }
    };
}

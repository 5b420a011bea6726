//! # protoweb
//!
//! Expose typed protobuf service methods as plain HTTP endpoints on
//! [Axum](https://github.com/tokio-rs/axum).
//!
//! Methods are registered by name on a [`ServiceBuilder`]. Each HTTP request
//! names its method and wire format with the `method` and `format`
//! parameters, carries its payload in the body or in the `request` parameter,
//! and gets back the encoded response message.
//!
//! ## Features
//!
//! - **Three wire formats:** protobuf JSON, protobuf binary and protobuf text,
//!   through a pluggable [`MessageCodec`].
//! - **Interceptors:** request interceptors may rewrite or short-circuit a
//!   call, response interceptors may rewrite or reject a response.
//! - **Middleware:** onion-style wrappers around the backend method.
//! - **Two routing modes:** one endpoint for all methods, or one path per
//!   method.
//!
//! ## Example
//!
//! ```ignore
//! use protoweb::prelude::*;
//!
//! async fn hello(_ctx: CallContext, req: HelloRequest) -> Result<HelloResponse, Status> {
//!     Ok(HelloResponse { message: format!("Hello {}", req.name) })
//! }
//!
//! let app: axum::Router = ServiceBuilder::new()
//!     .method("Hello", hello)
//!     .build()
//!     .into_router("/rpc");
//! ```

pub mod context;
pub mod dispatcher;
pub mod interceptor;
pub mod limits;
pub mod method;
pub mod middleware;
pub mod request;
mod response;
pub mod routing;
pub mod service;

#[cfg(test)]
mod testing;

pub use protoweb_core::*;

pub use context::CallContext;
pub use dispatcher::Dispatcher;
pub use interceptor::{InterceptorChain, RequestInterceptor, RequestOutcome, ResponseInterceptor};
pub use limits::MessageLimits;
pub use method::MethodDescriptor;
pub use middleware::{FnMiddleware, Handler, HandlerResult, Middleware, MiddlewareStack, Next};
pub use request::RequestEnvelope;
pub use routing::{proxy, snake_case};
pub use service::{ServiceBuilder, ServiceDefinition};

// Re-export several crates
pub use futures;
pub use prost;
pub use prost_reflect;

pub mod prelude {
    //! A prelude for `protoweb` providing the most common types.
    pub use crate::context::CallContext;
    pub use crate::middleware::{FnMiddleware, Middleware, Next};
    pub use crate::routing::proxy;
    pub use crate::service::ServiceBuilder;
    pub use protoweb_core::{AnyMessage, ProtoCodec, Status, WireFormat};
}

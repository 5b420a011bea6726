//! The `hello` package: one service with a single `Hello` method.
//!
//! Message types are generated from `protoweb-hello/proto/hello.proto`.

pub use protoweb_hello::{HelloRequest, HelloResponse};
use protoweb::{CallContext, Status};

/// Greets by name.
#[derive(Debug, Default)]
pub struct HelloService;

impl HelloService {
    pub async fn hello(&self, _ctx: CallContext, req: HelloRequest) -> Result<HelloResponse, Status> {
        if req.name.is_empty() {
            return Err(Status::plain("No name"));
        }
        Ok(HelloResponse {
            message: format!("Hello {}", req.name),
        })
    }
}

protoweb::register_methods!(HelloService {
    "Hello" => hello,
});

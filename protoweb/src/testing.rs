//! Hello messages shared by the unit tests.

pub(crate) use protoweb_hello::{HelloRequest, HelloResponse};

pub(crate) fn request(name: &str) -> HelloRequest {
    HelloRequest {
        name: name.to_owned(),
    }
}

pub(crate) fn response(message: &str) -> HelloResponse {
    HelloResponse {
        message: message.to_owned(),
    }
}

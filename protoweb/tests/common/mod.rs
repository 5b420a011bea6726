//! Messages and helpers shared by the integration tests.

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub use protoweb_hello::{ErrorDetail, HelloRequest, HelloResponse};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
    }

    pub fn nosniff(&self) -> bool {
        self.headers
            .get(http::header::X_CONTENT_TYPE_OPTIONS)
            .is_some_and(|v| v == "nosniff")
    }
}

pub async fn send(router: Router, req: http::Request<Body>) -> TestResponse {
    let res = router.oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = res.into_body().collect().await.unwrap().to_bytes().to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn post(router: Router, uri: &str, body: impl Into<Body>) -> TestResponse {
    let req = http::Request::builder()
        .method("POST")
        .uri(uri)
        .body(body.into())
        .unwrap();
    send(router, req).await
}

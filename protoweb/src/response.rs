//! HTTP responses written by the dispatcher.
//!
//! Every response carries `X-Content-Type-Options: nosniff`.

use axum::response::{IntoResponse, Response};
use http::header::{self, HeaderValue};
use http::StatusCode;
use protoweb_core::{BoxedCodec, Encoded, Status, TEXT_CONTENT_TYPE};

fn respond(status: StatusCode, content_type: &'static str, body: impl IntoResponse) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// 200 with the encoded response message.
pub(crate) fn success(encoded: Encoded) -> Response {
    respond(StatusCode::OK, encoded.content_type, encoded.body)
}

/// Plain-text error body, without a trailing newline.
pub(crate) fn plain_text(status: StatusCode, message: &str) -> Response {
    respond(status, TEXT_CONTENT_TYPE, message.to_owned())
}

/// Error response for `status`.
///
/// A structured payload is encoded with `codec` in `format`; if that fails
/// the plain-text message is written instead, with the same status.
pub(crate) fn error(status: &Status, codec: Option<&BoxedCodec>, format: &str) -> Response {
    let code = status.http_status();
    if let (Some(payload), Some(codec)) = (status.payload(), codec) {
        match codec.encode(payload, format) {
            Ok(encoded) => return respond(code, encoded.content_type, encoded.body),
            Err(err) => {
                tracing::warn!(
                    payload = %payload.full_name(),
                    format,
                    error = %err,
                    "failed to encode error payload, falling back to plain text"
                );
            }
        }
    }
    plain_text(code, status.message())
}

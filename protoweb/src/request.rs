//! Request envelope extraction.
//!
//! Dispatch parameters come from the query string and, for
//! `application/x-www-form-urlencoded` bodies, from the form (form values win).
//! The payload is the inline `request` parameter when present, otherwise the
//! HTTP body. The body stream is read at most once.
//!
//! Parameters are decoded as UTF-8 text, so a raw inline `request` cannot
//! carry arbitrary bytes. Binary payloads go inline with `base64=1`, or in the
//! body.

use axum::body::Body;
use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use bytes::Bytes;
use http::request::Parts;
use http::{Request, header};
use http_body_util::LengthLimitError;
use serde::Deserialize;
use std::error::Error as _;
use tokio::time::Instant;

use protoweb_core::Status;

use crate::context::{CallContext, ServerConfig, client_timeout, effective_timeout};
use crate::limits::MessageLimits;

/// URL-safe base64 that accepts both padded and unpadded input.
const URL_SAFE_INDIFFERENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Query or form parameters understood by the dispatcher.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub(crate) struct DispatchParams {
    /// Exposed operation name.
    #[serde(default)]
    pub method: Option<String>,
    /// Wire format token.
    #[serde(default)]
    pub format: Option<String>,
    /// Inline payload, used instead of the HTTP body.
    ///
    /// Must percent-decode to valid UTF-8, otherwise the whole parameter set
    /// is rejected with 400. Set `base64` to send binary payloads.
    #[serde(default)]
    pub request: Option<String>,
    /// Whether `request` is base64-encoded ("1" or "true").
    #[serde(default)]
    pub base64: Option<String>,
}

impl DispatchParams {
    pub fn parse(query: &str) -> Result<Self, Status> {
        serde_qs::from_str(query)
            .map_err(|err| Status::bad_request(format!("Invalid parameters, {err}")))
    }

    /// Fill unset fields from `fallback`.
    fn or(self, fallback: Self) -> Self {
        Self {
            method: self.method.or(fallback.method),
            format: self.format.or(fallback.format),
            request: self.request.or(fallback.request),
            base64: self.base64.or(fallback.base64),
        }
    }

    fn is_base64(&self) -> bool {
        matches!(self.base64.as_deref(), Some("1") | Some("true"))
    }

    /// Decode the inline payload, if any.
    pub fn inline_payload(&self) -> Result<Option<Bytes>, Status> {
        let Some(request) = &self.request else {
            return Ok(None);
        };
        if self.is_base64() {
            let bytes = URL_SAFE_INDIFFERENT
                .decode(request)
                .map_err(|err| Status::bad_request(format!("Invalid base64 request, {err}")))?;
            Ok(Some(Bytes::from(bytes)))
        } else {
            Ok(Some(Bytes::copy_from_slice(request.as_bytes())))
        }
    }
}

/// The per-call values extracted from an HTTP request.
#[derive(Debug)]
pub struct RequestEnvelope {
    pub context: CallContext,
    pub payload: Bytes,
}

/// An HTTP request whose parameters are parsed but whose payload is not yet
/// read.
pub(crate) struct PendingRequest {
    parts: Parts,
    pub params: DispatchParams,
    /// `None` once the body was consumed as a form.
    body: Option<Body>,
}

impl PendingRequest {
    pub async fn from_request(req: Request<Body>, limits: &MessageLimits) -> Result<Self, Status> {
        let (parts, body) = req.into_parts();
        let query = DispatchParams::parse(parts.uri.query().unwrap_or(""))?;

        if !is_form(&parts) {
            return Ok(Self {
                parts,
                params: query,
                body: Some(body),
            });
        }

        let bytes = read_body(body, limits).await?;
        let form = std::str::from_utf8(&bytes)
            .map_err(|err| Status::bad_request(format!("Invalid parameters, {err}")))
            .and_then(DispatchParams::parse)?;
        Ok(Self {
            parts,
            params: form.or(query),
            body: None,
        })
    }

    /// Resolve the payload and build the call context.
    pub async fn into_envelope(
        self,
        method: &str,
        format: &str,
        config: &ServerConfig,
    ) -> Result<RequestEnvelope, Status> {
        let payload = match self.params.inline_payload()? {
            Some(inline) => {
                config.limits.check_size(inline.len())?;
                inline
            }
            None => match self.body {
                Some(body) => read_body(body, &config.limits).await?,
                None => Bytes::new(),
            },
        };

        let timeout = effective_timeout(config.server_timeout, client_timeout(&self.parts.headers));
        let context = CallContext::new(method)
            .with_format(format)
            .with_deadline(timeout.map(|timeout| Instant::now() + timeout))
            .with_headers(self.parts.headers)
            .with_extensions(self.parts.extensions);

        Ok(RequestEnvelope { context, payload })
    }
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

async fn read_body(body: Body, limits: &MessageLimits) -> Result<Bytes, Status> {
    axum::body::to_bytes(body, limits.body_limit())
        .await
        .map_err(|err| {
            let message = format!("Read request from HTTP body failed, {err}");
            let too_large = err
                .source()
                .is_some_and(|source| source.is::<LengthLimitError>());
            if too_large {
                Status::payload_too_large(message)
            } else {
                Status::bad_request(message)
            }
        })
}

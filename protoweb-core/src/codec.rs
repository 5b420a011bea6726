//! Wire formats and the message codec seam.
//!
//! This module provides:
//! - [`WireFormat`]: the negotiated payload encoding (`json`, `binary`, `text`)
//! - [`MessageCodec`]: decode/encode of [`AnyMessage`] values for a format token
//! - [`ProtoCodec`]: the default codec built on `prost` and `prost-reflect`
//! - [`BoxedCodec`]: a cheaply clonable, type-erased codec handle

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use prost_reflect::{DeserializeOptions, DynamicMessage, SerializeOptions};
use serde::{Deserialize, Serialize};

use crate::message::AnyMessage;

/// Content type written for [`WireFormat::Json`] responses.
pub const JSON_CONTENT_TYPE: &str = "text/json; charset=utf-8";
/// Content type written for [`WireFormat::Binary`] responses.
pub const BINARY_CONTENT_TYPE: &str = "application/x-protobuf";
/// Content type written for [`WireFormat::Text`] responses.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Payload encoding selected per call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Canonical proto3 JSON mapping.
    #[default]
    Json,
    /// Native protobuf binary encoding.
    #[serde(alias = "proto")]
    Binary,
    /// Protobuf text format.
    Text,
}

impl WireFormat {
    /// The token used in the `format` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::Binary => "binary",
            WireFormat::Text => "text",
        }
    }

    /// Response content type for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Json => JSON_CONTENT_TYPE,
            WireFormat::Binary => BINARY_CONTENT_TYPE,
            WireFormat::Text => TEXT_CONTENT_TYPE,
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(WireFormat::Json),
            // "proto" is what older clients send for the binary encoding
            "binary" | "proto" => Ok(WireFormat::Binary),
            "text" => Ok(WireFormat::Text),
            other => Err(CodecError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// Errors produced by a [`MessageCodec`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The format token is not one the codec understands.
    #[error("unknown format {0}")]
    UnsupportedFormat(String),

    /// The payload could not be decoded.
    #[error("malformed {format} payload: {reason}")]
    Malformed { format: WireFormat, reason: String },

    /// The message could not be encoded.
    #[error("{format} encoding failed: {reason}")]
    Encode { format: WireFormat, reason: String },

    /// The message is not of the type the caller expected.
    #[error("unexpected message type: expected {expected}, got {actual}")]
    UnexpectedMessage { expected: String, actual: String },
}

impl CodecError {
    fn malformed(format: WireFormat, reason: impl fmt::Display) -> Self {
        CodecError::Malformed {
            format,
            reason: reason.to_string(),
        }
    }

    fn encode(format: WireFormat, reason: impl fmt::Display) -> Self {
        CodecError::Encode {
            format,
            reason: reason.to_string(),
        }
    }
}

/// An encoded message ready to be written to an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Decode/encode capability consumed by the dispatcher.
///
/// The format is passed as the raw token from the request so that a codec
/// may support formats beyond [`WireFormat`]. Codecs must reject tokens
/// they do not know with [`CodecError::UnsupportedFormat`].
///
/// # Example
///
/// ```ignore
/// use protoweb_core::{AnyMessage, CodecError, Encoded, MessageCodec, ProtoCodec};
///
/// /// Accepts only JSON, whatever the client asks for.
/// struct JsonOnly(ProtoCodec);
///
/// impl MessageCodec for JsonOnly {
///     fn decode(&self, dst: &mut dyn AnyMessage, src: &[u8], format: &str) -> Result<(), CodecError> {
///         match format {
///             "json" => self.0.decode(dst, src, format),
///             other => Err(CodecError::UnsupportedFormat(other.to_owned())),
///         }
///     }
///
///     fn encode(&self, src: &dyn AnyMessage, format: &str) -> Result<Encoded, CodecError> {
///         match format {
///             "json" => self.0.encode(src, format),
///             other => Err(CodecError::UnsupportedFormat(other.to_owned())),
///         }
///     }
/// }
/// ```
pub trait MessageCodec: Send + Sync + 'static {
    /// Decode `src` into `dst`.
    ///
    /// An empty `src` must succeed and leave `dst` untouched.
    fn decode(&self, dst: &mut dyn AnyMessage, src: &[u8], format: &str) -> Result<(), CodecError>;

    /// Encode `src` for the given format.
    fn encode(&self, src: &dyn AnyMessage, format: &str) -> Result<Encoded, CodecError>;
}

/// A boxed codec for type-erased storage.
#[derive(Clone)]
pub struct BoxedCodec(Arc<dyn MessageCodec>);

impl BoxedCodec {
    /// Create a new boxed codec.
    pub fn new<C: MessageCodec>(codec: C) -> Self {
        BoxedCodec(Arc::new(codec))
    }

    pub fn decode(
        &self,
        dst: &mut dyn AnyMessage,
        src: &[u8],
        format: &str,
    ) -> Result<(), CodecError> {
        self.0.decode(dst, src, format)
    }

    pub fn encode(&self, src: &dyn AnyMessage, format: &str) -> Result<Encoded, CodecError> {
        self.0.encode(src, format)
    }
}

impl Default for BoxedCodec {
    fn default() -> Self {
        BoxedCodec::new(ProtoCodec::default())
    }
}

impl fmt::Debug for BoxedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxedCodec").finish_non_exhaustive()
    }
}

/// Protobuf codec for the three [`WireFormat`]s.
///
/// JSON follows the canonical proto3 mapping: field names in lowerCamelCase,
/// default-valued fields omitted, 64-bit integers as strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtoCodec {
    /// Write fields that hold their default value in JSON output.
    pub emit_defaults: bool,
    /// Use the `.proto` field names instead of lowerCamelCase in JSON output.
    pub proto_field_names: bool,
    /// Skip unknown fields when decoding JSON instead of failing.
    pub ignore_unknown_fields: bool,
}

impl ProtoCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit_defaults(mut self, emit: bool) -> Self {
        self.emit_defaults = emit;
        self
    }

    pub fn proto_field_names(mut self, enabled: bool) -> Self {
        self.proto_field_names = enabled;
        self
    }

    pub fn ignore_unknown_fields(mut self, ignore: bool) -> Self {
        self.ignore_unknown_fields = ignore;
        self
    }

    fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions::new()
            .skip_default_fields(!self.emit_defaults)
            .use_proto_field_name(self.proto_field_names)
    }

    fn deserialize_options(&self) -> DeserializeOptions {
        DeserializeOptions::new().deny_unknown_fields(!self.ignore_unknown_fields)
    }

    fn decode_json(&self, dst: &mut dyn AnyMessage, src: &[u8]) -> Result<(), CodecError> {
        let malformed = |e: serde_json::Error| CodecError::malformed(WireFormat::Json, e);

        let mut deserializer = serde_json::Deserializer::from_slice(src);
        let message = DynamicMessage::deserialize_with_options(
            dst.descriptor(),
            &mut deserializer,
            &self.deserialize_options(),
        )
        .map_err(malformed)?;
        deserializer.end().map_err(malformed)?;

        dst.assign_dynamic(&message)
            .map_err(|e| CodecError::malformed(WireFormat::Json, e))
    }

    fn decode_text(dst: &mut dyn AnyMessage, src: &[u8]) -> Result<(), CodecError> {
        let text =
            std::str::from_utf8(src).map_err(|e| CodecError::malformed(WireFormat::Text, e))?;
        let message = DynamicMessage::parse_text_format(dst.descriptor(), text)
            .map_err(|e| CodecError::malformed(WireFormat::Text, e))?;
        dst.assign_dynamic(&message)
            .map_err(|e| CodecError::malformed(WireFormat::Text, e))
    }

    fn encode_json(&self, src: &dyn AnyMessage) -> Result<Vec<u8>, CodecError> {
        let mut serializer = serde_json::Serializer::new(Vec::new());
        src.to_dynamic()
            .serialize_with_options(&mut serializer, &self.serialize_options())
            .map_err(|e| CodecError::encode(WireFormat::Json, e))?;
        Ok(serializer.into_inner())
    }
}

impl MessageCodec for ProtoCodec {
    fn decode(&self, dst: &mut dyn AnyMessage, src: &[u8], format: &str) -> Result<(), CodecError> {
        let format: WireFormat = format.parse()?;
        if src.is_empty() {
            return Ok(());
        }
        match format {
            WireFormat::Json => self.decode_json(dst, src),
            WireFormat::Binary => dst
                .decode_binary(src)
                .map_err(|e| CodecError::malformed(WireFormat::Binary, e)),
            WireFormat::Text => Self::decode_text(dst, src),
        }
    }

    fn encode(&self, src: &dyn AnyMessage, format: &str) -> Result<Encoded, CodecError> {
        let format: WireFormat = format.parse()?;
        let body = match format {
            WireFormat::Json => self.encode_json(src)?,
            WireFormat::Binary => src.encode_binary(),
            WireFormat::Text => src.to_dynamic().to_text_format().into_bytes(),
        };
        Ok(Encoded {
            content_type: format.content_type(),
            body: Bytes::from(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::tests::{Empty, Greeting, greeting};

    fn round_trip(codec: &ProtoCodec, format: &str) {
        let encoded = codec.encode(&greeting(), format).unwrap();
        let mut decoded = Greeting::default();
        codec.decode(&mut decoded, &encoded.body, format).unwrap();
        assert_eq!(decoded, greeting(), "format {format}");
    }

    #[test]
    fn test_wire_format_from_str() {
        assert_eq!("json".parse(), Ok(WireFormat::Json));
        assert_eq!("binary".parse(), Ok(WireFormat::Binary));
        assert_eq!("proto".parse(), Ok(WireFormat::Binary));
        assert_eq!("text".parse(), Ok(WireFormat::Text));
        assert_eq!(
            "xml".parse::<WireFormat>(),
            Err(CodecError::UnsupportedFormat("xml".to_owned()))
        );
    }

    #[test]
    fn test_wire_format_content_types() {
        assert_eq!(WireFormat::Json.content_type(), "text/json; charset=utf-8");
        assert_eq!(WireFormat::Binary.content_type(), "application/x-protobuf");
        assert_eq!(WireFormat::Text.content_type(), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_wire_format_serde() {
        let format: WireFormat = serde_json::from_str("\"proto\"").unwrap();
        assert_eq!(format, WireFormat::Binary);
        assert_eq!(serde_json::to_string(&WireFormat::Text).unwrap(), "\"text\"");
    }

    #[test]
    fn test_round_trip_all_formats() {
        let codec = ProtoCodec::default();
        for format in ["json", "binary", "text"] {
            round_trip(&codec, format);
        }
    }

    #[test]
    fn test_json_is_canonical() {
        let codec = ProtoCodec::default();
        let encoded = codec.encode(&greeting(), "json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded.body).unwrap();

        assert_eq!(encoded.content_type, JSON_CONTENT_TYPE);
        assert_eq!(value["text"], "hi");
        assert_eq!(value["repeatCount"], "3");
        assert_eq!(value["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_json_omits_defaults_unless_asked() {
        let encoded = ProtoCodec::default()
            .encode(&Greeting::default(), "json")
            .unwrap();
        assert_eq!(&encoded.body[..], b"{}");

        let encoded = ProtoCodec::new()
            .emit_defaults(true)
            .proto_field_names(true)
            .encode(&Greeting::default(), "json")
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&encoded.body).unwrap();
        assert_eq!(value["text"], "");
        assert!(value.get("repeat_count").is_some());
    }

    #[test]
    fn test_empty_payload_is_noop() {
        let codec = ProtoCodec::default();
        for format in ["json", "binary", "text"] {
            let mut msg = greeting();
            codec.decode(&mut msg, b"", format).unwrap();
            assert_eq!(msg, greeting());
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let codec = ProtoCodec::default();
        let mut msg = Greeting::default();

        let err = codec.decode(&mut msg, b"{}", "xml").unwrap_err();
        assert_eq!(err, CodecError::UnsupportedFormat("xml".to_owned()));

        // Unknown tokens fail even without a payload.
        let err = codec.decode(&mut msg, b"", "xml").unwrap_err();
        assert_eq!(err, CodecError::UnsupportedFormat("xml".to_owned()));

        let err = codec.encode(&msg, "yaml").unwrap_err();
        assert_eq!(err.to_string(), "unknown format yaml");
    }

    #[test]
    fn test_malformed_payloads() {
        let codec = ProtoCodec::default();
        let mut msg = Greeting::default();

        let err = codec.decode(&mut msg, b"{not json", "json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { format: WireFormat::Json, .. }));

        let err = codec.decode(&mut msg, b"{} trailing", "json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { format: WireFormat::Json, .. }));

        let err = codec.decode(&mut msg, &[0xff, 0xff, 0xff], "binary").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { format: WireFormat::Binary, .. }));

        let err = codec.decode(&mut msg, b"text: ", "text").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { format: WireFormat::Text, .. }));
    }

    #[test]
    fn test_unknown_json_fields() {
        let strict = ProtoCodec::default();
        let mut msg = Greeting::default();
        assert!(strict.decode(&mut msg, br#"{"nope":1}"#, "json").is_err());

        let lenient = ProtoCodec::new().ignore_unknown_fields(true);
        lenient
            .decode(&mut msg, br#"{"nope":1,"text":"x"}"#, "json")
            .unwrap();
        assert_eq!(msg.text, "x");
    }

    #[test]
    fn test_empty_message_encodes() {
        let codec = BoxedCodec::default();
        let binary = codec.encode(&Empty {}, "binary").unwrap();
        assert!(binary.body.is_empty());
        assert_eq!(binary.content_type, BINARY_CONTENT_TYPE);

        let text = codec.encode(&Empty {}, "text").unwrap();
        assert_eq!(text.content_type, TEXT_CONTENT_TYPE);
    }

    #[test]
    fn test_boxed_codec_debug() {
        let debug_str = format!("{:?}", BoxedCodec::default());
        assert!(debug_str.contains("BoxedCodec"));
    }
}

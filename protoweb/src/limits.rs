//! Request payload size limits.
//!
//! One limit covers both places a payload can come from: the HTTP body
//! stream and the inline `request` parameter.

use protoweb_core::Status;

/// 4 MiB, the usual protobuf receive limit.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Maximum accepted request payload.
///
/// ```rust
/// use protoweb::MessageLimits;
///
/// let small = MessageLimits::new(64 * 1024);
/// assert_eq!(small.max_message_size(), Some(65536));
/// assert!(MessageLimits::unlimited().max_message_size().is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageLimits {
    max: Option<usize>,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }
}

impl MessageLimits {
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max: Some(max_message_size),
        }
    }

    /// Accept payloads of any size. Any client can then make the server
    /// buffer an arbitrarily large body.
    pub fn unlimited() -> Self {
        Self { max: None }
    }

    pub fn max_message_size(&self) -> Option<usize> {
        self.max
    }

    /// Limit handed to `axum::body::to_bytes`.
    pub(crate) fn body_limit(&self) -> usize {
        self.max.unwrap_or(usize::MAX)
    }

    /// Reject a payload of `len` bytes with 413 if it is over the limit.
    pub fn check_size(&self, len: usize) -> Result<(), Status> {
        match self.max {
            Some(max) if len > max => Err(Status::payload_too_large(format!(
                "request of {len} bytes is larger than the {max} byte limit"
            ))),
            _ => Ok(()),
        }
    }
}

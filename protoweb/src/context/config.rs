//! Dispatcher-wide settings.
//!
//! Set once by the builder, read by every request.

use crate::limits::MessageLimits;
use protoweb_core::WireFormat;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ServerConfig {
    /// Format used when the request names none
    pub default_format: WireFormat,
    /// Request payload limits
    pub limits: MessageLimits,
    /// Server-side timeout (optional)
    pub server_timeout: Option<Duration>,
}

//! Core types for protoweb.
//!
//! This crate has no HTTP framework dependency. It provides the pieces the
//! dispatcher in `protoweb` is built on.
//!
//! ## Modules
//!
//! - [`message`]: Type-erased structured messages
//! - [`codec`]: Wire formats and the message codec
//! - [`error`]: The status-carrying error type

pub mod codec;
pub mod error;
pub mod message;

pub use codec::*;
pub use error::*;
pub use message::{AnyMessage, downcast};

//! Type-erased structured messages.
//!
//! Backend operations are written against concrete protobuf types, but the
//! dispatcher, interceptors and codecs handle every operation's messages
//! through the same object-safe [`AnyMessage`] view.
//!
//! Any `T: prost_reflect::ReflectMessage + Default + Debug + 'static` is an
//! [`AnyMessage`], so generated prost types that carry a descriptor work
//! without further glue.

use std::any::Any;
use std::fmt;

use prost::DecodeError;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};

/// A structured message the dispatcher can hand to codecs and interceptors.
pub trait AnyMessage: Send + Sync + fmt::Debug + 'static {
    /// Schema of the message.
    fn descriptor(&self) -> MessageDescriptor;

    /// Copy this message into a [`DynamicMessage`] with the same descriptor.
    fn to_dynamic(&self) -> DynamicMessage;

    /// Replace the contents of this message with a dynamic message of the same schema.
    fn assign_dynamic(&mut self, message: &DynamicMessage) -> Result<(), DecodeError>;

    /// Native compact binary encoding.
    fn encode_binary(&self) -> Vec<u8>;

    /// Replace the contents of this message by decoding `buf`.
    fn decode_binary(&mut self, buf: &[u8]) -> Result<(), DecodeError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> AnyMessage for T
where
    T: ReflectMessage + Default + fmt::Debug + 'static,
{
    fn descriptor(&self) -> MessageDescriptor {
        ReflectMessage::descriptor(self)
    }

    fn to_dynamic(&self) -> DynamicMessage {
        self.transcode_to_dynamic()
    }

    fn assign_dynamic(&mut self, message: &DynamicMessage) -> Result<(), DecodeError> {
        *self = message.transcode_to::<T>()?;
        Ok(())
    }

    fn encode_binary(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    fn decode_binary(&mut self, buf: &[u8]) -> Result<(), DecodeError> {
        *self = T::decode(buf)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

impl<'a> dyn AnyMessage + 'a {
    /// Fully-qualified protobuf name, e.g. `hello.HelloRequest`.
    pub fn full_name(&self) -> String {
        self.descriptor().full_name().to_owned()
    }

    /// Returns `true` if the erased message is a `T`.
    pub fn is<T: AnyMessage>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the message as a concrete `T`.
    pub fn downcast_ref<T: AnyMessage>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the message as a concrete `T`.
    pub fn downcast_mut<T: AnyMessage>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Take ownership of an erased message as a concrete `T`.
///
/// Returns the original box on type mismatch.
pub fn downcast<T>(mut message: Box<dyn AnyMessage>) -> Result<T, Box<dyn AnyMessage>>
where
    T: AnyMessage + Default,
{
    if let Some(value) = message.downcast_mut::<T>() {
        return Ok(std::mem::take(value));
    }
    Err(message)
}

//! Method descriptors and their invocation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future;
use prost_reflect::MessageDescriptor;
use protoweb_core::{AnyMessage, BoxedCodec, CodecError, Encoded, Status, downcast};

use crate::context::CallContext;
use crate::interceptor::InterceptorChain;
use crate::middleware::Handler;

/// Erase a typed backend function into a [`Handler`].
///
/// The request handed to the handler must be a `Req`; anything else (for
/// example a middleware that swapped the message) fails with 500, reported
/// the same way as a response of the wrong type.
pub(crate) fn erase<Req, Res, F, Fut>(f: F) -> Handler
where
    Req: AnyMessage + Default,
    Res: AnyMessage,
    F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, Status>> + Send + 'static,
{
    Arc::new(move |ctx, request| match downcast::<Req>(request) {
        Ok(request) => {
            let call = f(ctx, request);
            async move {
                let response: Res = call.await?;
                Ok::<_, Status>(Box::new(response) as Box<dyn AnyMessage>)
            }
            .boxed()
        }
        Err(actual) => {
            let expected = Req::default().descriptor();
            let err = unexpected_message(expected.full_name(), &actual.full_name());
            future::ready(Err::<Box<dyn AnyMessage>, _>(err)).boxed()
        }
    })
}

fn new_message<T: AnyMessage + Default>() -> Box<dyn AnyMessage> {
    Box::new(T::default())
}

/// A registered method, before the dispatcher's codec, interceptors and
/// middleware are attached.
pub(crate) struct MethodEntry {
    pub name: String,
    pub new_request: fn() -> Box<dyn AnyMessage>,
    pub response: MessageDescriptor,
    pub handler: Handler,
}

impl MethodEntry {
    pub fn new<Req, Res, F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        Req: AnyMessage + Default,
        Res: AnyMessage + Default,
        F: Fn(CallContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, Status>> + Send + 'static,
    {
        Self {
            name: name.into(),
            new_request: new_message::<Req>,
            response: Res::default().descriptor(),
            handler: erase(f),
        }
    }
}

/// A single callable method of a dispatcher.
///
/// Immutable once built. Holds the request shape, the (middleware-wrapped)
/// invocation and the codec and interceptors shared with the other methods.
pub struct MethodDescriptor {
    name: String,
    new_request: fn() -> Box<dyn AnyMessage>,
    response: MessageDescriptor,
    handler: Handler,
    codec: BoxedCodec,
    interceptors: Arc<InterceptorChain>,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("request", &(self.new_request)().full_name())
            .field("response", &self.response.full_name())
            .finish_non_exhaustive()
    }
}

impl MethodDescriptor {
    pub(crate) fn new(
        entry: MethodEntry,
        codec: BoxedCodec,
        interceptors: Arc<InterceptorChain>,
    ) -> Self {
        Self {
            name: entry.name,
            new_request: entry.new_request,
            response: entry.response,
            handler: entry.handler,
            codec,
            interceptors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema of the request message.
    pub fn request_descriptor(&self) -> MessageDescriptor {
        (self.new_request)().descriptor()
    }

    /// Schema of the response message.
    pub fn response_descriptor(&self) -> &MessageDescriptor {
        &self.response
    }

    pub fn codec(&self) -> &BoxedCodec {
        &self.codec
    }

    /// Decode, intercept, invoke, intercept and encode one call.
    ///
    /// The format is taken from `ctx` and used for both decoding and
    /// encoding. An empty `raw` payload leaves the request at its default
    /// value.
    pub async fn invoke(&self, ctx: CallContext, raw: &[u8]) -> Result<Encoded, Status> {
        let mut request = (self.new_request)();
        if !raw.is_empty() {
            self.codec
                .decode(request.as_mut(), raw, ctx.format())
                .map_err(|e| decode_error(&e))?;
        }

        // Middleware and short-circuits both hand back untyped messages.
        let mut response = match self.interceptors.run_request(&ctx, request.as_mut())? {
            Some(response) => response,
            None => (self.handler)(ctx.clone(), request).await?,
        };
        self.check_response(response.as_ref())?;

        self.interceptors.run_response(&ctx, response.as_mut())?;

        self.codec
            .encode(response.as_ref(), ctx.format())
            .map_err(|e| encode_error(&e))
    }

    fn check_response(&self, response: &dyn AnyMessage) -> Result<(), Status> {
        let actual = response.descriptor();
        if actual.full_name() == self.response.full_name() {
            return Ok(());
        }
        Err(unexpected_message(self.response.full_name(), actual.full_name()))
    }
}

/// A message of the wrong type reached the codec boundary, in either
/// direction. Always a server-side fault.
pub(crate) fn unexpected_message(expected: &str, actual: &str) -> Status {
    encode_error(&CodecError::UnexpectedMessage {
        expected: expected.to_owned(),
        actual: actual.to_owned(),
    })
}

pub(crate) fn decode_error(err: &CodecError) -> Status {
    Status::bad_request(format!("Decode request failed, {err}"))
}

pub(crate) fn encode_error(err: &CodecError) -> Status {
    let message = format!("Encode response failed, {err}");
    match err {
        CodecError::UnsupportedFormat(_) => Status::bad_request(message),
        _ => Status::internal(message),
    }
}

//! The outbound side: sending a request to an origin server and streaming
//! its response back.
//!
//! [`OriginClient`] is what the proxy handler depends on. [`Http1OriginClient`]
//! implements it over one plain TCP connection per client connection.

mod body;
mod client;
mod error;
mod head;

use std::borrow::Cow;

use bytes::Bytes;
use micro_proxy_http::handler::BodySource;
use micro_proxy_http::protocol::ResponseHead;

pub use body::{BodyDecoder, BodyFraming, BodyItem};
pub use client::{Http1OriginClient, OriginBody, Reconnect, encode_request};
pub use error::OriginError;
pub use head::{OriginHead, ResponseHeadDecoder};

/// The response of an origin, in the shape the connection pipeline writes.
pub type OriginResponse<B> = ResponseHead<B>;

/// A header field forwarded to the origin. Known names and values are
/// shared static strings, anything else is an owned copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundHeader {
    pub name: Cow<'static, str>,
    pub value: Cow<'static, str>,
}

impl OutboundHeader {
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// One request as sent to the origin. `Host` and the framing of `body` are
/// added by the client, `headers` must contain neither.
#[derive(Debug, Clone)]
pub struct OutboundRequest<'a> {
    pub method: &'a str,
    pub path_and_query: &'a [u8],
    pub headers: &'a [OutboundHeader],
    pub body: Bytes,
}

impl OutboundRequest<'_> {
    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// Sends requests to one origin, one at a time.
///
/// The body of a returned response borrows the client, so the next request
/// can only be sent once the previous response is dropped.
pub trait OriginClient: Send {
    type Body<'a>: BodySource + Send
    where
        Self: 'a;

    fn send(
        &mut self,
        request: &OutboundRequest<'_>,
    ) -> impl Future<Output = Result<OriginResponse<Self::Body<'_>>, OriginError>> + Send;
}

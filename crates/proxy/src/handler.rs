//! Forwards every request of a client connection to its origin.

use std::borrow::Cow;

use bytes::Bytes;
use micro_proxy_http::codec::header::known;
use micro_proxy_http::handler::RequestHandler;
use micro_proxy_http::protocol::{HttpMethod, ParseError, RequestLine};
use tracing::trace;
use triomphe::Arc;

use crate::downstream::DownstreamTarget;
use crate::origin::{OriginClient, OriginError, OriginResponse, OutboundHeader, OutboundRequest};

/// Request fields that describe the client connection or the request
/// framing. The origin client writes its own; `Expect` is answered by the
/// pipeline before the body is read.
const NOT_FORWARDED: [&str; 7] =
    ["host", "content-length", "connection", "keep-alive", "proxy-connection", "te", "expect"];

/// A [`RequestHandler`] turning each parsed request into an
/// [`OutboundRequest`] for one origin.
///
/// The method, target and header buffers are reused for every request of
/// the connection.
#[derive(Debug)]
pub struct ProxyHandler<C> {
    target: Arc<DownstreamTarget>,
    client: C,
    method: Cow<'static, str>,
    path_and_query: Vec<u8>,
    headers: Vec<OutboundHeader>,
}

impl<C: OriginClient> ProxyHandler<C> {
    pub fn new(target: Arc<DownstreamTarget>, client: C) -> Self {
        Self { target, client, method: Cow::Borrowed("GET"), path_and_query: Vec::new(), headers: Vec::new() }
    }

    pub fn target(&self) -> &DownstreamTarget {
        &self.target
    }
}

impl<C: OriginClient> RequestHandler for ProxyHandler<C> {
    type Body<'a>
        = C::Body<'a>
    where
        Self: 'a;

    type Error = OriginError;

    fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError> {
        let method = line.method();
        if method == HttpMethod::Connect {
            return Err(ParseError::UnsupportedMethod { method: "CONNECT" });
        }

        self.method = match method.as_str() {
            Some(name) => Cow::Borrowed(name),
            // extension methods are tokens, always ASCII
            None => Cow::Owned(String::from_utf8_lossy(line.method_bytes()).into_owned()),
        };
        self.target.resolve_target(line.target(), &mut self.path_and_query);
        self.headers.clear();
        Ok(())
    }

    fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        if NOT_FORWARDED.iter().any(|skipped| name.eq_ignore_ascii_case(skipped.as_bytes())) {
            trace!(name = %String::from_utf8_lossy(name), "header not forwarded");
            return Ok(());
        }

        let header = match known::lookup(name) {
            Some(known) => OutboundHeader::new(known.name(), known.value(value)),
            None => OutboundHeader::new(
                String::from_utf8_lossy(name).into_owned(),
                String::from_utf8_lossy(value).into_owned(),
            ),
        };
        self.headers.push(header);
        Ok(())
    }

    async fn process_request(&mut self, body: Bytes) -> Result<OriginResponse<C::Body<'_>>, OriginError> {
        let request = OutboundRequest {
            method: &self.method,
            path_and_query: &self.path_and_query,
            headers: &self.headers,
            body,
        };
        trace!(
            method = request.method,
            target = %String::from_utf8_lossy(request.path_and_query),
            "forwarding request"
        );
        self.client.send(&request).await
    }
}

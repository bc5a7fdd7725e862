//! The contract between the connection pipeline and whatever serves the
//! requests it parses.
//!
//! A [`RequestHandler`] is owned by exactly one connection. It sees the
//! request head as parser events, gets the request body once the head is
//! complete, and answers with a [`ResponseHead`] whose body is a
//! [`BodySource`] the pipeline drains into the client connection.

use std::error::Error;
use std::io;

use bytes::Bytes;

use crate::protocol::{ParseError, RequestLine, ResponseHead};

/// A pull based producer of response body bytes.
#[trait_variant::make(Send)]
pub trait BodySource {
    /// Reads the next bytes of the body into `buf`, returning how many were
    /// written. `Ok(0)` marks the end of the body.
    ///
    /// The pipeline may poll a read once and drop it if it does not complete
    /// immediately, so implementations must not lose data when the returned
    /// future is dropped before completion.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A body with no bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBody;

impl BodySource for EmptyBody {
    async fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

/// A body held in memory.
#[derive(Debug, Clone, Default)]
pub struct BytesBody {
    remaining: Bytes,
}

impl BytesBody {
    pub fn new(bytes: Bytes) -> Self {
        Self { remaining: bytes }
    }
}

impl BodySource for BytesBody {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.remaining.len());
        let chunk = self.remaining.split_to(len);
        buf[..len].copy_from_slice(&chunk);
        Ok(len)
    }
}

/// Serves the requests of one connection, strictly one after another.
///
/// For each request the pipeline calls [`on_start_line`](Self::on_start_line),
/// then [`on_header`](Self::on_header) once per header in arrival order, then
/// [`on_headers_complete`](Self::on_headers_complete) and finally
/// [`process_request`](Self::process_request). The response body is fully
/// drained before the next request starts, so a handler can keep per-request
/// scratch state in `self` and reuse it.
pub trait RequestHandler: Send {
    type Body<'a>: BodySource + Send
    where
        Self: 'a;

    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Rejecting the request here aborts the connection.
    fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError>;

    fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError>;

    fn on_headers_complete(&mut self) -> Result<(), ParseError> {
        Ok(())
    }

    /// Produces the response for the request described by the preceding
    /// events. `body` holds the complete request body, empty if there was
    /// none.
    fn process_request(
        &mut self,
        body: Bytes,
    ) -> impl Future<Output = Result<ResponseHead<Self::Body<'_>>, Self::Error>> + Send;
}

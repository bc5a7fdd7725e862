//! Response head handed from a [`RequestHandler`](crate::handler::RequestHandler)
//! to the connection pipeline.
//!
//! Header fields are kept as byte ranges into one shared block, so a response
//! head parsed from an origin connection can be forwarded without copying
//! each name and value.

use bytes::{Bytes, BytesMut};
use http::StatusCode;

/// Start and end byte positions of a header's name and value inside the
/// header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderIndex {
    pub name: (usize, usize),
    pub value: (usize, usize),
}

impl HeaderIndex {
    /// Records where `name` and `value` sit inside `block`. Both slices must
    /// borrow from `block`.
    pub fn record(block: &[u8], name: &[u8], value: &[u8]) -> Self {
        let block_ptr = block.as_ptr() as usize;
        let name_start = name.as_ptr() as usize - block_ptr;
        let value_start = value.as_ptr() as usize - block_ptr;
        Self { name: (name_start, name_start + name.len()), value: (value_start, value_start + value.len()) }
    }
}

/// Ordered header fields of a response.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    block: Bytes,
    index: Vec<HeaderIndex>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already parsed header block.
    pub fn from_parts(block: Bytes, index: Vec<HeaderIndex>) -> Self {
        debug_assert!(index.iter().all(|i| i.name.1 <= block.len() && i.value.1 <= block.len()));
        Self { block, index }
    }

    pub fn builder() -> ResponseHeadersBuilder {
        ResponseHeadersBuilder::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.index.iter().map(|i| (&self.block[i.name.0..i.name.1], &self.block[i.value.0..i.value.1]))
    }

    /// Case insensitive lookup of the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.iter().find(|(n, _)| n.eq_ignore_ascii_case(name.as_bytes())).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Builds [`ResponseHeaders`] field by field, copying into one block.
#[derive(Debug, Default)]
pub struct ResponseHeadersBuilder {
    block: BytesMut,
    index: Vec<HeaderIndex>,
}

impl ResponseHeadersBuilder {
    pub fn header(mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Self {
        self.push(name.as_ref(), value.as_ref());
        self
    }

    pub fn push(&mut self, name: &[u8], value: &[u8]) {
        let name_start = self.block.len();
        self.block.extend_from_slice(name);
        let value_start = self.block.len();
        self.block.extend_from_slice(value);
        self.index.push(HeaderIndex {
            name: (name_start, value_start),
            value: (value_start, value_start + value.len()),
        });
    }

    pub fn build(self) -> ResponseHeaders {
        ResponseHeaders { block: self.block.freeze(), index: self.index }
    }
}

/// Status, headers and body source of one response.
///
/// `chunked` selects how the pipeline copies `body`: verbatim when the
/// headers already frame it (Content-Length or read until close), or re-framed
/// with chunked transfer coding. The headers are written as given, so a
/// chunked response must carry its own `Transfer-Encoding` field.
#[derive(Debug)]
pub struct ResponseHead<B> {
    status: StatusCode,
    reason: Option<Bytes>,
    headers: ResponseHeaders,
    body: B,
    chunked: bool,
}

impl<B> ResponseHead<B> {
    pub fn new(status: StatusCode, headers: ResponseHeaders, body: B) -> Self {
        Self { status, reason: None, headers, body, chunked: false }
    }

    /// Uses `reason` instead of the canonical reason phrase of the status.
    #[must_use]
    pub fn with_reason(mut self, reason: Bytes) -> Self {
        self.reason = Some(reason);
        self
    }

    #[must_use]
    pub fn with_chunked(mut self, chunked: bool) -> Self {
        self.chunked = chunked;
        self
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase to write, falling back to the canonical one and
    /// then to an empty phrase for unregistered codes.
    pub fn reason(&self) -> &[u8] {
        match &self.reason {
            Some(reason) => reason.as_ref(),
            None => self.status.canonical_reason().unwrap_or("").as_bytes(),
        }
    }

    #[inline]
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }
}

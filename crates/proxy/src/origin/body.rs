//! Decoders for origin response bodies.
//!
//! The framing of a response body is fixed by its head: no body at all, a
//! `Content-Length`, chunked transfer coding, or everything up to the origin
//! closing the connection. [`BodyDecoder`] covers all four as a
//! [`tokio_util::codec::Decoder`] over the origin connection's read buffer.

use std::cmp;
use std::task::Poll;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::origin::OriginError;

/// An item produced while decoding a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Chunk(Bytes),
    Eof,
}

/// How the body of one response is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    Empty,
    Length(u64),
    Chunked,
    UntilClose,
}

impl BodyFraming {
    /// Whether the end of the body leaves the connection usable for another
    /// exchange.
    pub fn is_self_delimited(self) -> bool {
        !matches!(self, Self::UntilClose)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Empty,
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    UntilClose,
}

impl BodyDecoder {
    pub fn new(framing: BodyFraming) -> Self {
        let kind = match framing {
            BodyFraming::Empty => Kind::Empty,
            BodyFraming::Length(0) => Kind::Empty,
            BodyFraming::Length(length) => Kind::Length(LengthDecoder::new(length)),
            BodyFraming::Chunked => Kind::Chunked(ChunkedDecoder::new()),
            BodyFraming::UntilClose => Kind::UntilClose,
        };
        Self { kind }
    }
}

impl Decoder for BodyDecoder {
    type Item = BodyItem;
    type Error = OriginError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Empty => Ok(Some(BodyItem::Eof)),
            Kind::Length(decoder) => Ok(decoder.decode(src)),
            Kind::Chunked(decoder) => decoder.decode(src),
            Kind::UntilClose if src.is_empty() => Ok(None),
            Kind::UntilClose => Ok(Some(BodyItem::Chunk(src.split().freeze()))),
        }
    }

    /// Only a body read until close may end with the connection.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if matches!(self.kind, Kind::UntilClose) => Ok(Some(BodyItem::Eof)),
            None => Err(OriginError::UnexpectedEof),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LengthDecoder {
    remaining: u64,
}

impl LengthDecoder {
    fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    fn decode(&mut self, src: &mut BytesMut) -> Option<BodyItem> {
        if self.remaining == 0 {
            return Some(BodyItem::Eof);
        }
        if src.is_empty() {
            return None;
        }

        // bounded by src.len()
        let len = cmp::min(self.remaining, src.len() as u64) as usize;
        self.remaining -= len as u64;
        Some(BodyItem::Chunk(src.split_to(len).freeze()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChunkedDecoder {
    state: ChunkedState,
    remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    Size,
    SizeLws,
    Extension,
    SizeLf,
    Body,
    BodyCr,
    BodyLf,
    Trailer,
    TrailerLf,
    EndCr,
    EndLf,
    End,
}

impl ChunkedDecoder {
    fn new() -> Self {
        Self { state: ChunkedState::Size, remaining: 0 }
    }

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BodyItem>, OriginError> {
        loop {
            if self.state == ChunkedState::End {
                trace!("finished reading chunked origin body");
                return Ok(Some(BodyItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            let mut chunk = None;
            self.state = match self.state.step(src, &mut self.remaining, &mut chunk) {
                Poll::Pending => return Ok(None),
                Poll::Ready(state) => state?,
            };

            if let Some(bytes) = chunk {
                return Ok(Some(BodyItem::Chunk(bytes)));
            }
        }
    }
}

macro_rules! next_byte {
    ($src:ident) => {{
        if $src.is_empty() {
            return Poll::Pending;
        }
        $src.get_u8()
    }};
}

type Step = Poll<Result<ChunkedState, OriginError>>;

impl ChunkedState {
    fn step(self, src: &mut BytesMut, remaining: &mut u64, chunk: &mut Option<Bytes>) -> Step {
        use ChunkedState::*;

        match self {
            Size => read_size(src, remaining),
            SizeLws => read_size_lws(src),
            Extension => read_extension(src),
            SizeLf => read_size_lf(src, *remaining),
            Body => read_body(src, remaining, chunk),
            BodyCr => expect(src, b'\r', BodyLf, "invalid chunk body CR"),
            BodyLf => expect(src, b'\n', Size, "invalid chunk body LF"),
            Trailer => match next_byte!(src) {
                b'\r' => Poll::Ready(Ok(TrailerLf)),
                _ => Poll::Ready(Ok(Trailer)),
            },
            TrailerLf => expect(src, b'\n', EndCr, "invalid trailer end LF"),
            EndCr => match next_byte!(src) {
                b'\r' => Poll::Ready(Ok(EndLf)),
                _ => Poll::Ready(Ok(Trailer)),
            },
            EndLf => expect(src, b'\n', End, "invalid chunk end LF"),
            End => Poll::Ready(Ok(End)),
        }
    }
}

fn expect(src: &mut BytesMut, byte: u8, next: ChunkedState, reason: &'static str) -> Step {
    if next_byte!(src) == byte {
        Poll::Ready(Ok(next))
    } else {
        Poll::Ready(Err(OriginError::invalid_body(reason)))
    }
}

fn read_size(src: &mut BytesMut, size: &mut u64) -> Step {
    let digit = match next_byte!(src) {
        b @ b'0'..=b'9' => b - b'0',
        b @ b'a'..=b'f' => b + 10 - b'a',
        b @ b'A'..=b'F' => b + 10 - b'A',
        b'\t' | b' ' => return Poll::Ready(Ok(ChunkedState::SizeLws)),
        b';' => return Poll::Ready(Ok(ChunkedState::Extension)),
        b'\r' => return Poll::Ready(Ok(ChunkedState::SizeLf)),
        _ => return Poll::Ready(Err(OriginError::invalid_body("invalid chunk size"))),
    };

    match size.checked_mul(16).and_then(|s| s.checked_add(u64::from(digit))) {
        Some(new_size) => {
            *size = new_size;
            Poll::Ready(Ok(ChunkedState::Size))
        }
        None => Poll::Ready(Err(OriginError::invalid_body("chunk size overflow"))),
    }
}

fn read_size_lws(src: &mut BytesMut) -> Step {
    match next_byte!(src) {
        // no more digits after whitespace
        b'\t' | b' ' => Poll::Ready(Ok(ChunkedState::SizeLws)),
        b';' => Poll::Ready(Ok(ChunkedState::Extension)),
        b'\r' => Poll::Ready(Ok(ChunkedState::SizeLf)),
        _ => Poll::Ready(Err(OriginError::invalid_body("invalid chunk size linear white space"))),
    }
}

fn read_extension(src: &mut BytesMut) -> Step {
    // extensions are skipped up to the CRLF; a bare LF is rejected
    match next_byte!(src) {
        b'\r' => Poll::Ready(Ok(ChunkedState::SizeLf)),
        b'\n' => Poll::Ready(Err(OriginError::invalid_body("chunk extension contains newline"))),
        _ => Poll::Ready(Ok(ChunkedState::Extension)),
    }
}

fn read_size_lf(src: &mut BytesMut, size: u64) -> Step {
    match next_byte!(src) {
        b'\n' if size == 0 => Poll::Ready(Ok(ChunkedState::EndCr)),
        b'\n' => Poll::Ready(Ok(ChunkedState::Body)),
        _ => Poll::Ready(Err(OriginError::invalid_body("invalid chunk size LF"))),
    }
}

fn read_body(src: &mut BytesMut, remaining: &mut u64, chunk: &mut Option<Bytes>) -> Step {
    if *remaining == 0 {
        return Poll::Ready(Ok(ChunkedState::BodyCr));
    }
    if src.is_empty() {
        return Poll::Pending;
    }

    // bounded by src.len()
    let len = cmp::min(*remaining, src.len() as u64) as usize;
    *remaining -= len as u64;
    *chunk = Some(src.split_to(len).freeze());

    if *remaining > 0 { Poll::Ready(Ok(ChunkedState::Body)) } else { Poll::Ready(Ok(ChunkedState::BodyCr)) }
}

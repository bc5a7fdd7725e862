use std::error::Error;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("handler error: {source}")]
    HandlerError { source: Box<dyn Error + Send + Sync> },
}

impl HttpError {
    pub fn handler<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::HandlerError { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: &'static str },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: &'static str },

    #[error("invalid http version")]
    InvalidVersion,

    #[error("invalid http method")]
    InvalidMethod,

    #[error("unsupported http method: {method}")]
    UnsupportedMethod { method: &'static str },

    #[error("unsupported transfer-encoding on request")]
    UnsupportedTransferEncoding,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("request body size {current_size} exceed the limit {max_size}")]
    TooLargeBody { current_size: u64, max_size: u64 },

    #[error("unexpected end of stream while reading request head")]
    UnexpectedEof,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_request_line(reason: &'static str) -> Self {
        Self::InvalidRequestLine { reason }
    }

    pub fn invalid_header(reason: &'static str) -> Self {
        Self::InvalidHeader { reason }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_body(current_size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { current_size, max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("read response body error: {source}")]
    Body { source: io::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn body(e: io::Error) -> Self {
        Self::Body { source: e }
    }
}

/// Errors raised by the HPACK integer, string and header field codecs.
///
/// Running out of input or output space is never an error: decoders return
/// `Ok(None)` and encoders return `None` in that case.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpackError {
    #[error("integer encoded with a redundant trailing continuation byte")]
    OverlongInteger,

    #[error("integer does not fit in 64 bits")]
    IntegerOverflow,

    #[error("invalid static table index {index}")]
    InvalidStaticIndex { index: u64 },

    #[error("invalid header field representation")]
    InvalidRepresentation,
}

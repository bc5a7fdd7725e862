use std::io;
use thiserror::Error;

/// Failures talking to an origin server. All of them end the client
/// connection that triggered the exchange.
#[derive(Error, Debug)]
pub enum OriginError {
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("origin response head too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHead { current_size: usize, max_size: usize },

    #[error("origin response has too many headers, exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid origin response head: {reason}")]
    InvalidHead { reason: String },

    #[error("invalid origin response body: {reason}")]
    InvalidBody { reason: String },

    #[error("origin closed the connection before the response was complete")]
    UnexpectedEof,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl OriginError {
    pub fn connect(host: &str, port: u16, source: io::Error) -> Self {
        Self::Connect { host: host.to_owned(), port, source }
    }

    pub fn too_large_head(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHead { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_head<S: ToString>(reason: S) -> Self {
        Self::InvalidHead { reason: reason.to_string() }
    }

    pub fn invalid_body<S: ToString>(reason: S) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }
}

/// Body reads surface through [`BodySource`](micro_proxy_http::handler::BodySource)
/// as `io::Error`, keeping the origin error as the source.
impl From<OriginError> for io::Error {
    fn from(e: OriginError) -> Self {
        match e {
            OriginError::Io { source } => source,
            OriginError::UnexpectedEof => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

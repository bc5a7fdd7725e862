//! Request line types handed out by the parser.
//!
//! Everything here borrows from the connection's read buffer and is only
//! valid for the duration of the parser callback that received it.

use std::fmt;

/// The request method, with an escape hatch for extension methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
    Post,
    Head,
    Trace,
    Patch,
    Connect,
    Options,
    Custom,
}

impl HttpMethod {
    /// Recognizes the standard methods. Method names are case sensitive.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            b"GET" => Self::Get,
            b"PUT" => Self::Put,
            b"DELETE" => Self::Delete,
            b"POST" => Self::Post,
            b"HEAD" => Self::Head,
            b"TRACE" => Self::Trace,
            b"PATCH" => Self::Patch,
            b"CONNECT" => Self::Connect,
            b"OPTIONS" => Self::Options,
            _ => Self::Custom,
        }
    }

    /// Returns the canonical name, `None` for [`HttpMethod::Custom`].
    pub const fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Get => Some("GET"),
            Self::Put => Some("PUT"),
            Self::Delete => Some("DELETE"),
            Self::Post => Some("POST"),
            Self::Head => Some("HEAD"),
            Self::Trace => Some("TRACE"),
            Self::Patch => Some("PATCH"),
            Self::Connect => Some("CONNECT"),
            Self::Options => Some("OPTIONS"),
            Self::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    pub(crate) fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"HTTP/1.1" => Some(Self::Http11),
            b"HTTP/1.0" => Some(Self::Http10),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http10 => f.write_str("HTTP/1.0"),
            Self::Http11 => f.write_str("HTTP/1.1"),
        }
    }
}

/// A parsed request line, `METHOD SP target SP version`.
///
/// The target is kept as an offset and length into `line`.
#[derive(Debug, Clone, Copy)]
pub struct RequestLine<'a> {
    line: &'a [u8],
    method: HttpMethod,
    method_len: usize,
    target_offset: usize,
    target_len: usize,
    version: HttpVersion,
}

impl<'a> RequestLine<'a> {
    pub(crate) fn new(
        line: &'a [u8],
        method: HttpMethod,
        method_len: usize,
        target_offset: usize,
        target_len: usize,
        version: HttpVersion,
    ) -> Self {
        Self { line, method, method_len, target_offset, target_len, version }
    }

    #[inline]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The method exactly as sent, useful for [`HttpMethod::Custom`].
    #[inline]
    pub fn method_bytes(&self) -> &'a [u8] {
        &self.line[..self.method_len]
    }

    #[inline]
    pub fn target(&self) -> &'a [u8] {
        &self.line[self.target_offset..self.target_offset + self.target_len]
    }

    #[inline]
    pub fn version(&self) -> HttpVersion {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_case_sensitive() {
        assert_eq!(HttpMethod::from_bytes(b"GET"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_bytes(b"get"), HttpMethod::Custom);
        assert_eq!(HttpMethod::from_bytes(b"PROPFIND"), HttpMethod::Custom);
        assert_eq!(HttpMethod::Connect.as_str(), Some("CONNECT"));
        assert_eq!(HttpMethod::Custom.as_str(), None);
    }

    #[test]
    fn test_target_view() {
        let line = b"GET /foo?x=1 HTTP/1.1";
        let request_line = RequestLine::new(line, HttpMethod::Get, 3, 4, 8, HttpVersion::Http11);
        assert_eq!(request_line.method_bytes(), b"GET");
        assert_eq!(request_line.target(), b"/foo?x=1");
        assert_eq!(request_line.version().to_string(), "HTTP/1.1");
    }
}

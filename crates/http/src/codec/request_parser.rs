//! Incremental parser for the request line and header block.
//!
//! The parser works on whatever prefix of the request is buffered. It reports
//! each complete line through [`ParseEvents`] as soon as it has it and returns
//! a [`Progress`]: `consumed` bytes are fully processed and must be dropped by
//! the caller, `examined` bytes were scanned without finding the end of the
//! current line. The next call must be given the buffer starting right after
//! the consumed bytes; the parser then resumes its scan where it stopped
//! instead of starting the line over.
//!
//! # Limits
//!
//! - Maximum size of the request head: 8KB
//! - Maximum number of headers: 64
//! - Only `HTTP/1.0` and `HTTP/1.1`, lines must end with CRLF, no obs-fold

use std::cmp;

use crate::ensure;
use crate::protocol::{HttpMethod, HttpVersion, ParseError, RequestLine};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the request line plus header section
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Receives the pieces of a request head as they are parsed.
///
/// All slices borrow the caller's buffer and are only valid during the call.
/// Returning an error aborts parsing; the error is returned from
/// [`RequestParser::parse`] unchanged.
pub trait ParseEvents {
    fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError>;

    fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError>;

    fn on_headers_complete(&mut self) -> Result<(), ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    StartLine,
    Headers,
    /// the head is complete, the body belongs to the caller
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub consumed: usize,
    pub examined: usize,
}

#[derive(Debug)]
pub struct RequestParser {
    state: ParseState,
    /// bytes of the current, incomplete line already searched for LF
    scanned: usize,
    /// bytes of the current request head consumed so far
    head_bytes: usize,
    header_count: usize,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self { state: ParseState::StartLine, scanned: 0, head_bytes: 0, header_count: 0 }
    }

    #[inline]
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Prepares the parser for the next request on the connection.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Parses as much of `buf` as possible.
    ///
    /// Stops after the blank line that ends the header block, so bytes of the
    /// body or of a pipelined request are never consumed. Calling `parse` in
    /// [`ParseState::Body`] consumes nothing.
    pub fn parse<E: ParseEvents>(&mut self, buf: &[u8], events: &mut E) -> Result<Progress, ParseError> {
        let mut start = 0;

        while self.state != ParseState::Body {
            let search_from = cmp::min(start + self.scanned, buf.len());
            let Some(lf) = buf[search_from..].iter().position(|&b| b == b'\n') else {
                let pending = buf.len() - start;
                ensure!(
                    self.head_bytes + pending <= MAX_HEADER_BYTES,
                    ParseError::too_large_header(self.head_bytes + pending, MAX_HEADER_BYTES)
                );
                self.scanned = pending;
                return Ok(Progress { consumed: start, examined: buf.len() });
            };

            let end = search_from + lf;
            let line_len = end + 1 - start;
            ensure!(
                self.head_bytes + line_len <= MAX_HEADER_BYTES,
                ParseError::too_large_header(self.head_bytes + line_len, MAX_HEADER_BYTES)
            );

            let line = match buf[start..end].split_last() {
                Some((&b'\r', line)) => line,
                _ if self.state == ParseState::StartLine => {
                    return Err(ParseError::invalid_request_line("line not terminated by CRLF"));
                }
                _ => return Err(ParseError::invalid_header("line not terminated by CRLF")),
            };

            match self.state {
                // empty lines before the request line are ignored
                ParseState::StartLine if line.is_empty() => {}
                ParseState::StartLine => {
                    let request_line = parse_request_line(line)?;
                    events.on_start_line(&request_line)?;
                    self.state = ParseState::Headers;
                }
                ParseState::Headers if line.is_empty() => {
                    events.on_headers_complete()?;
                    self.state = ParseState::Body;
                }
                ParseState::Headers => {
                    let (name, value) = parse_header_line(line)?;
                    self.header_count += 1;
                    ensure!(self.header_count <= MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
                    events.on_header(name, value)?;
                }
                ParseState::Body => unreachable!("loop exits in body state"),
            }

            self.head_bytes += line_len;
            self.scanned = 0;
            start = end + 1;
        }

        Ok(Progress { consumed: start, examined: start })
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine<'_>, ParseError> {
    let method_len =
        line.iter().position(|&b| b == b' ').ok_or(ParseError::invalid_request_line("missing request target"))?;
    let method = &line[..method_len];
    ensure!(!method.is_empty() && method.iter().all(|&b| is_tchar(b)), ParseError::InvalidMethod);

    let target_offset = method_len + 1;
    let target_len = line[target_offset..]
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ParseError::invalid_request_line("missing http version"))?;
    let target = &line[target_offset..target_offset + target_len];
    ensure!(
        !target.is_empty() && target.iter().all(u8::is_ascii_graphic),
        ParseError::invalid_request_line("invalid request target")
    );

    let version =
        HttpVersion::from_bytes(&line[target_offset + target_len + 1..]).ok_or(ParseError::InvalidVersion)?;

    Ok(RequestLine::new(line, HttpMethod::from_bytes(method), method_len, target_offset, target_len, version))
}

fn parse_header_line(line: &[u8]) -> Result<(&[u8], &[u8]), ParseError> {
    ensure!(!matches!(line[0], b' ' | b'\t'), ParseError::invalid_header("obsolete line folding"));

    let colon = line.iter().position(|&b| b == b':').ok_or(ParseError::invalid_header("missing colon"))?;
    let name = &line[..colon];
    ensure!(!name.is_empty() && name.iter().all(|&b| is_tchar(b)), ParseError::invalid_header("invalid header name"));

    let value = trim_ows(&line[colon + 1..]);
    ensure!(
        value.iter().all(|&b| b == b'\t' || (b >= 0x20 && b != 0x7F)),
        ParseError::invalid_header("invalid header value")
    );

    Ok((name, value))
}

fn trim_ows(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

/// token characters, RFC 9110 section 5.6.2
#[inline]
fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Recorded {
        method: Option<HttpMethod>,
        method_bytes: Vec<u8>,
        target: Vec<u8>,
        version: Option<HttpVersion>,
        headers: Vec<(Vec<u8>, Vec<u8>)>,
        complete: bool,
    }

    impl ParseEvents for Recorded {
        fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError> {
            self.method = Some(line.method());
            self.method_bytes = line.method_bytes().to_vec();
            self.target = line.target().to_vec();
            self.version = Some(line.version());
            Ok(())
        }

        fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
            self.headers.push((name.to_vec(), value.to_vec()));
            Ok(())
        }

        fn on_headers_complete(&mut self) -> Result<(), ParseError> {
            self.complete = true;
            Ok(())
        }
    }

    fn crlf(text: &str) -> Vec<u8> {
        text.replace('\n', "\r\n").into_bytes()
    }

    fn curl_request() -> Vec<u8> {
        crlf(indoc! {r##"
        GET /index.html?a=1 HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*
        X-Padded:   spaced value

        "##})
    }

    fn parse_whole(data: &[u8]) -> (Recorded, Progress) {
        let mut parser = RequestParser::new();
        let mut recorded = Recorded::default();
        let progress = parser.parse(data, &mut recorded).unwrap();
        (recorded, progress)
    }

    #[test]
    fn test_whole_request() {
        let data = curl_request();
        let (recorded, progress) = parse_whole(&data);

        assert_eq!(progress, Progress { consumed: data.len(), examined: data.len() });
        assert_eq!(recorded.method, Some(HttpMethod::Get));
        assert_eq!(recorded.target, b"/index.html?a=1");
        assert_eq!(recorded.version, Some(HttpVersion::Http11));
        assert_eq!(recorded.headers.len(), 4);
        assert_eq!(recorded.headers[0], (b"Host".to_vec(), b"127.0.0.1:8080".to_vec()));
        assert_eq!(recorded.headers[3], (b"X-Padded".to_vec(), b"spaced value".to_vec()));
        assert!(recorded.complete);
    }

    #[test]
    fn test_byte_at_a_time() {
        let data = curl_request();
        let (expected, _) = parse_whole(&data);

        let mut parser = RequestParser::new();
        let mut recorded = Recorded::default();
        let mut consumed = 0;
        for end in 1..=data.len() {
            let progress = parser.parse(&data[consumed..end], &mut recorded).unwrap();
            assert!(progress.consumed <= progress.examined);
            assert_eq!(progress.examined, end - consumed);
            consumed += progress.consumed;
        }

        assert_eq!(parser.state(), ParseState::Body);
        assert_eq!(consumed, data.len());
        assert_eq!(recorded, expected);
    }

    #[test]
    fn test_split_at_every_boundary() {
        let data = curl_request();
        let (expected, _) = parse_whole(&data);

        for split in 1..data.len() {
            let mut parser = RequestParser::new();
            let mut recorded = Recorded::default();
            let first = parser.parse(&data[..split], &mut recorded).unwrap();
            let second = parser.parse(&data[first.consumed..], &mut recorded).unwrap();
            assert_eq!(first.consumed + second.consumed, data.len(), "split at {split}");
            assert_eq!(recorded, expected, "split at {split}");
        }
    }

    #[test]
    fn test_stops_at_end_of_head() {
        let mut data = crlf("POST /upload HTTP/1.1\nContent-Length: 3\n\n");
        let head_len = data.len();
        data.extend_from_slice(b"abcGET / HTTP/1.1\r\n\r\n");

        let mut parser = RequestParser::new();
        let mut recorded = Recorded::default();
        let progress = parser.parse(&data, &mut recorded).unwrap();
        assert_eq!(progress.consumed, head_len);
        assert_eq!(parser.state(), ParseState::Body);

        // nothing is consumed until the caller resets
        assert_eq!(parser.parse(&data[head_len..], &mut recorded).unwrap().consumed, 0);

        parser.reset();
        let mut next = Recorded::default();
        let progress = parser.parse(&data[head_len + 3..], &mut next).unwrap();
        assert_eq!(progress.consumed, data.len() - head_len - 3);
        assert_eq!(next.method, Some(HttpMethod::Get));
    }

    #[test]
    fn test_leading_empty_lines() {
        let (recorded, _) = parse_whole(b"\r\n\r\nGET / HTTP/1.0\r\n\r\n");
        assert_eq!(recorded.version, Some(HttpVersion::Http10));
        assert!(recorded.complete);
    }

    #[test]
    fn test_extension_method() {
        let (recorded, _) = parse_whole(b"PROPFIND /dav HTTP/1.1\r\n\r\n");
        assert_eq!(recorded.method, Some(HttpMethod::Custom));
        assert_eq!(recorded.method_bytes, b"PROPFIND");
    }

    fn parse_err(data: &[u8]) -> ParseError {
        RequestParser::new().parse(data, &mut Recorded::default()).unwrap_err()
    }

    #[test]
    fn test_invalid_request_lines() {
        assert!(matches!(parse_err(b"GET /\r\n"), ParseError::InvalidRequestLine { .. }));
        assert!(matches!(parse_err(b"GET / HTTP/2.0\r\n"), ParseError::InvalidVersion));
        assert!(matches!(parse_err(b"G(T / HTTP/1.1\r\n"), ParseError::InvalidMethod));
        assert!(matches!(parse_err(b"GET  HTTP/1.1\r\n"), ParseError::InvalidRequestLine { .. }));
        assert!(matches!(parse_err(b"GET / HTTP/1.1\n"), ParseError::InvalidRequestLine { .. }));
    }

    #[test]
    fn test_invalid_headers() {
        assert!(matches!(parse_err(b"GET / HTTP/1.1\r\nHost: a\r\n folded\r\n"), ParseError::InvalidHeader { .. }));
        assert!(matches!(parse_err(b"GET / HTTP/1.1\r\nNoColon\r\n"), ParseError::InvalidHeader { .. }));
        assert!(matches!(parse_err(b"GET / HTTP/1.1\r\nBad Name: a\r\n"), ParseError::InvalidHeader { .. }));
        assert!(matches!(parse_err(b"GET / HTTP/1.1\r\nA: \x01\r\n"), ParseError::InvalidHeader { .. }));
    }

    #[test]
    fn test_too_many_headers() {
        let mut data = b"GET / HTTP/1.1\r\n".to_vec();
        for i in 0..=MAX_HEADER_NUM {
            data.extend_from_slice(format!("X-{i}: v\r\n").as_bytes());
        }
        assert!(matches!(parse_err(&data), ParseError::TooManyHeaders { max_num: MAX_HEADER_NUM }));
    }

    #[test]
    fn test_too_large_header() {
        let mut data = b"GET / HTTP/1.1\r\nX-Large: ".to_vec();
        data.extend(std::iter::repeat_n(b'a', MAX_HEADER_BYTES));
        assert!(matches!(parse_err(&data), ParseError::TooLargeHeader { .. }));
    }

    #[test]
    fn test_event_error_aborts() {
        struct RejectAll;
        impl ParseEvents for RejectAll {
            fn on_start_line(&mut self, _line: &RequestLine<'_>) -> Result<(), ParseError> {
                Err(ParseError::UnsupportedMethod { method: "CONNECT" })
            }
            fn on_header(&mut self, _name: &[u8], _value: &[u8]) -> Result<(), ParseError> {
                Ok(())
            }
            fn on_headers_complete(&mut self) -> Result<(), ParseError> {
                Ok(())
            }
        }

        let result = RequestParser::new().parse(b"CONNECT a:443 HTTP/1.1\r\n\r\n", &mut RejectAll);
        assert!(matches!(result, Err(ParseError::UnsupportedMethod { .. })));
    }
}

//! Origin response head decoding.
//!
//! The head is parsed with `httparse`, then split off the read buffer as one
//! block; forwarded header fields are byte ranges into that block, nothing is
//! copied per field.
//!
//! Hop-by-hop fields (`Connection`, `Keep-Alive`) are consumed here and not
//! forwarded, the client connection has its own. A body delimited by the
//! origin closing the connection is re-framed as chunked toward the client,
//! so a `Transfer-Encoding: chunked` field is appended for it.

use bytes::{Bytes, BytesMut};
use http::StatusCode;
use httparse::{EMPTY_HEADER, Status};
use micro_proxy_http::codec::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
use micro_proxy_http::protocol::{HeaderIndex, ResponseHeaders};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::origin::OriginError;
use crate::origin::body::BodyFraming;

const TRANSFER_ENCODING_CHUNKED: &[u8] = b"Transfer-Encoding: chunked";
const TRANSFER_ENCODING_NAME_LEN: usize = b"Transfer-Encoding".len();

/// A decoded origin response head.
#[derive(Debug)]
pub struct OriginHead {
    pub status: StatusCode,
    /// the origin's reason phrase, if it sent one
    pub reason: Option<Bytes>,
    pub headers: ResponseHeaders,
    pub framing: BodyFraming,
    /// the body must be re-framed as chunked toward the client
    pub chunked: bool,
    /// the origin connection can carry another exchange after this body
    pub reusable: bool,
}

/// Decodes one response head.
///
/// `head_request` must be set when the request was `HEAD`: such a response
/// never has a body, whatever its headers say.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseHeadDecoder {
    head_request: bool,
}

impl ResponseHeadDecoder {
    pub fn new(head_request: bool) -> Self {
        Self { head_request }
    }
}

impl Decoder for ResponseHeadDecoder {
    type Item = OriginHead;
    type Error = OriginError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(head) = self.decode_one(src)? else {
                return Ok(None);
            };
            // an interim response is dropped, the final one follows it
            if head.status.is_informational() && head.status != StatusCode::SWITCHING_PROTOCOLS {
                trace!(status = head.status.as_u16(), "skipping interim origin response");
                continue;
            }
            return Ok(Some(head));
        }
    }
}

impl ResponseHeadDecoder {
    fn decode_one(&self, src: &mut BytesMut) -> Result<Option<OriginHead>, OriginError> {
        let mut headers = [EMPTY_HEADER; MAX_HEADER_NUM];
        let mut response = httparse::Response::new(&mut headers);

        let body_offset = match response.parse(src) {
            Ok(Status::Complete(body_offset)) => body_offset,
            Ok(Status::Partial) => {
                if src.len() > MAX_HEADER_BYTES {
                    return Err(OriginError::too_large_head(src.len(), MAX_HEADER_BYTES));
                }
                return Ok(None);
            }
            Err(httparse::Error::TooManyHeaders) => return Err(OriginError::too_many_headers(MAX_HEADER_NUM)),
            Err(e) => return Err(OriginError::invalid_head(e)),
        };
        if body_offset > MAX_HEADER_BYTES {
            return Err(OriginError::too_large_head(body_offset, MAX_HEADER_BYTES));
        }

        let version_11 = match response.version {
            Some(1) => true,
            Some(0) => false,
            version => return Err(OriginError::invalid_head(format!("unsupported version {version:?}"))),
        };
        let code = response.code.ok_or_else(|| OriginError::invalid_head("missing status code"))?;
        let status = StatusCode::from_u16(code).map_err(OriginError::invalid_head)?;
        let reason_range = response.reason.filter(|r| !r.is_empty()).map(|r| offset_in(src, r.as_bytes()));

        let mut fields = FieldScan::new(version_11);
        let mut index = Vec::with_capacity(response.headers.len() + 1);
        for header in response.headers.iter() {
            if fields.forward(header.name, header.value)? {
                index.push(HeaderIndex::record(src, header.name.as_bytes(), header.value));
            }
        }

        let framing = fields.framing(self.head_request, status)?;
        let chunked = matches!(framing, BodyFraming::Chunked | BodyFraming::UntilClose);
        let reusable = fields.keep_alive && framing.is_self_delimited();

        let mut block = src.split_to(body_offset);
        if framing == BodyFraming::UntilClose {
            let start = block.len();
            block.extend_from_slice(TRANSFER_ENCODING_CHUNKED);
            index.push(HeaderIndex {
                name: (start, start + TRANSFER_ENCODING_NAME_LEN),
                value: (start + TRANSFER_ENCODING_NAME_LEN + 2, block.len()),
            });
        }
        if fields.dropped_content_length {
            index.retain(|i| !block[i.name.0..i.name.1].eq_ignore_ascii_case(b"content-length"));
        }

        let block = block.freeze();
        let reason = reason_range.map(|(start, end)| block.slice(start..end));
        trace!(status = code, ?framing, reusable, "decoded origin response head");

        Ok(Some(OriginHead { status, reason, headers: ResponseHeaders::from_parts(block, index), framing, chunked, reusable }))
    }
}

/// Framing and connection state gathered from the header fields.
#[derive(Debug)]
struct FieldScan {
    content_length: Option<u64>,
    transfer_encoding: Option<bool>,
    keep_alive: bool,
    dropped_content_length: bool,
}

impl FieldScan {
    fn new(version_11: bool) -> Self {
        Self { content_length: None, transfer_encoding: None, keep_alive: version_11, dropped_content_length: false }
    }

    /// Records a field and tells whether it is forwarded to the client.
    fn forward(&mut self, name: &str, value: &[u8]) -> Result<bool, OriginError> {
        if name.eq_ignore_ascii_case("content-length") {
            let length = parse_content_length(value)?;
            if self.content_length.is_some_and(|existing| existing != length) {
                return Err(OriginError::invalid_head("conflicting content-length values"));
            }
            self.content_length = Some(length);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            // the last coding decides, a later field overrides an earlier one
            let last = value.rsplit(|&b| b == b',').next().unwrap_or_default();
            self.transfer_encoding = Some(last.trim_ascii().eq_ignore_ascii_case(b"chunked"));
        } else if name.eq_ignore_ascii_case("connection") {
            for token in value.split(|&b| b == b',').map(<[u8]>::trim_ascii) {
                if token.eq_ignore_ascii_case(b"close") {
                    self.keep_alive = false;
                } else if token.eq_ignore_ascii_case(b"keep-alive") {
                    self.keep_alive = true;
                }
            }
            return Ok(false);
        } else if name.eq_ignore_ascii_case("keep-alive") {
            return Ok(false);
        }
        Ok(true)
    }

    fn framing(&mut self, head_request: bool, status: StatusCode) -> Result<BodyFraming, OriginError> {
        if head_request
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            return Ok(BodyFraming::Empty);
        }

        match (self.transfer_encoding, self.content_length) {
            (Some(true), content_length) => {
                // chunked wins over a content-length sent along with it
                self.dropped_content_length = content_length.is_some();
                Ok(BodyFraming::Chunked)
            }
            (Some(false), _) => Err(OriginError::invalid_head("transfer-encoding does not end with chunked")),
            (None, Some(length)) => Ok(BodyFraming::Length(length)),
            (None, None) => Ok(BodyFraming::UntilClose),
        }
    }
}

fn offset_in(block: &[u8], part: &[u8]) -> (usize, usize) {
    let start = part.as_ptr() as usize - block.as_ptr() as usize;
    (start, start + part.len())
}

fn parse_content_length(value: &[u8]) -> Result<u64, OriginError> {
    let value = value.trim_ascii();
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(OriginError::invalid_head(format!("invalid content-length {:?}", String::from_utf8_lossy(value))));
    }
    value
        .iter()
        .try_fold(0u64, |acc, &b| acc.checked_mul(10)?.checked_add(u64::from(b - b'0')))
        .ok_or_else(|| OriginError::invalid_head("content-length overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn crlf(text: &str) -> BytesMut {
        BytesMut::from(text.replace('\n', "\r\n").as_str())
    }

    fn decode(text: &str) -> (OriginHead, BytesMut) {
        let mut src = crlf(text);
        let head = ResponseHeadDecoder::new(false).decode(&mut src).unwrap().unwrap();
        (head, src)
    }

    fn fields(headers: &ResponseHeaders) -> Vec<(String, String)> {
        headers
            .iter()
            .map(|(n, v)| (String::from_utf8_lossy(n).into_owned(), String::from_utf8_lossy(v).into_owned()))
            .collect()
    }

    #[test]
    fn test_content_length_response() {
        let (head, rest) = decode(indoc! {"
            HTTP/1.1 200 OK
            Content-Type: text/plain
            Content-Length: 2
            Connection: keep-alive

            hi"});

        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.reason.as_deref(), Some(&b"OK"[..]));
        assert_eq!(head.framing, BodyFraming::Length(2));
        assert!(!head.chunked);
        assert!(head.reusable);
        assert_eq!(
            fields(&head.headers),
            vec![("Content-Type".into(), "text/plain".into()), ("Content-Length".into(), "2".into())]
        );
        assert_eq!(&rest[..], b"hi");
    }

    #[test]
    fn test_chunked_response() {
        let (head, _) = decode("HTTP/1.1 201 Created\nTransfer-Encoding: chunked\nContent-Length: 9\n\n");

        assert_eq!(head.framing, BodyFraming::Chunked);
        assert!(head.chunked);
        assert!(head.reusable);
        assert_eq!(fields(&head.headers), vec![("Transfer-Encoding".into(), "chunked".into())]);
    }

    #[test]
    fn test_until_close_is_rechunked() {
        let (head, _) = decode("HTTP/1.0 200 OK\nServer: old\n\n");

        assert_eq!(head.framing, BodyFraming::UntilClose);
        assert!(head.chunked);
        assert!(!head.reusable);
        assert_eq!(
            fields(&head.headers),
            vec![("Server".into(), "old".into()), ("Transfer-Encoding".into(), "chunked".into())]
        );
    }

    #[test]
    fn test_no_body_statuses() {
        let (head, _) = decode("HTTP/1.1 304 Not Modified\nETag: \"x\"\n\n");
        assert_eq!(head.framing, BodyFraming::Empty);
        assert!(!head.chunked);

        let mut src = crlf("HTTP/1.1 200 OK\nContent-Length: 10\n\n");
        let head = ResponseHeadDecoder::new(true).decode(&mut src).unwrap().unwrap();
        assert_eq!(head.framing, BodyFraming::Empty);
        assert_eq!(head.headers.get("content-length"), Some(&b"10"[..]));
    }

    #[test]
    fn test_interim_response_skipped() {
        let (head, rest) = decode("HTTP/1.1 100 Continue\n\nHTTP/1.1 204 No Content\n\n");
        assert_eq!(head.status, StatusCode::NO_CONTENT);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_connection_close() {
        let (head, _) = decode("HTTP/1.1 200 OK\nContent-Length: 0\nConnection: close\n\n");
        assert!(!head.reusable);
        assert!(!head.headers.contains("connection"));
        assert_eq!(head.headers.get("content-length"), Some(&b"0"[..]));
    }

    #[test]
    fn test_partial_and_invalid() {
        let mut src = crlf("HTTP/1.1 200 OK\nContent-Le");
        assert!(ResponseHeadDecoder::new(false).decode(&mut src).unwrap().is_none());

        let mut src = crlf("HTTP/1.1 200 OK\nContent-Length: 1\nContent-Length: 2\n\n");
        assert!(matches!(ResponseHeadDecoder::new(false).decode(&mut src), Err(OriginError::InvalidHead { .. })));

        let mut src = crlf("HTTP/1.1 200 OK\nTransfer-Encoding: gzip\n\n");
        assert!(matches!(ResponseHeadDecoder::new(false).decode(&mut src), Err(OriginError::InvalidHead { .. })));

        let mut src = BytesMut::from(&b"garbage\r\n\r\n"[..]);
        assert!(matches!(ResponseHeadDecoder::new(false).decode(&mut src), Err(OriginError::InvalidHead { .. })));
    }

    #[test]
    fn test_too_large_head() {
        let mut src = BytesMut::from("HTTP/1.1 200 OK\r\nX-Big: ");
        src.extend_from_slice(&vec![b'a'; MAX_HEADER_BYTES]);
        assert!(matches!(ResponseHeadDecoder::new(false).decode(&mut src), Err(OriginError::TooLargeHead { .. })));
    }
}

//! Serializes a response head: status line, header fields and the blank line.
//!
//! Headers are written in the order the handler supplied them and exactly as
//! given. The only changes are the ones [`HeadOptions`] asks for: a prepared
//! `Date` line when the handler did not supply one, dropping
//! `Transfer-Encoding` for a body sent unframed, and announcing a persistent
//! connection to an HTTP/1.0 client.

use crate::codec::buffer_writer::{BufferSink, BufferWriter};
use crate::protocol::ResponseHead;
use http::StatusCode;

const STATUS_LINE_200: &[u8] = b"HTTP/1.1 200 OK\r\n";
const HTTP_11_PREFIX: &[u8] = b"HTTP/1.1 ";
const KEEP_ALIVE_LINE: &[u8] = b"Connection: keep-alive\r\n";

/// Room reserved for a typical response head, so the common case needs a
/// single window.
const HEAD_SIZE_HINT: usize = 512;

/// Adjustments the pipeline makes to a handler's head on the way out.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadOptions<'a> {
    /// a complete `Date: ...\r\n` line, written if the handler supplied no `Date`
    pub date_line: Option<&'a [u8]>,
    /// leave out `Transfer-Encoding`, the body ends with the connection
    pub unframed: bool,
    /// write `Connection: keep-alive`
    pub keep_alive: bool,
}

#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Writes the head of `response` into `sink` and commits it.
    pub fn encode_head<S: BufferSink, B>(&self, response: &ResponseHead<B>, options: &HeadOptions<'_>, sink: &mut S) {
        let mut writer = BufferWriter::with_size_hint(sink, HEAD_SIZE_HINT);

        write_status_line(&mut writer, response.status(), response.reason());

        for (name, value) in response.headers().iter() {
            if options.unframed && name.eq_ignore_ascii_case(b"transfer-encoding") {
                continue;
            }
            writer.write_header(name, value);
        }

        if options.keep_alive {
            writer.write(KEEP_ALIVE_LINE);
        }

        if let Some(date_line) = options.date_line {
            if !response.headers().contains("date") {
                writer.write(date_line);
            }
        }

        writer.write_crlf();
        writer.commit();
    }
}

fn write_status_line<S: BufferSink>(writer: &mut BufferWriter<'_, S>, status: StatusCode, reason: &[u8]) {
    if status == StatusCode::OK && reason == b"OK" {
        writer.write(STATUS_LINE_200);
        return;
    }

    writer.write(HTTP_11_PREFIX);
    writer.write_decimal(u32::from(status.as_u16()));
    writer.write_u8(b' ');
    writer.write(reason);
    writer.write_crlf();
}

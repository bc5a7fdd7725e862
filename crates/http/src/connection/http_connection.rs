use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, trace};

use crate::codec::{
    BufferSink, BufferWriter, FINAL_CHUNK, HeadOptions, ParseEvents, ParseState, RequestParser, ResponseEncoder,
};
use crate::connection::error_log::ErrorLogLimiter;
use crate::connection::request_reader::RequestReader;
use crate::connection::response_writer::ResponseWriter;
use crate::date::DateService;
use crate::ensure;
use crate::handler::{BodySource, RequestHandler};
use crate::protocol::{HttpError, HttpVersion, ParseError, RequestLine, ResponseHead, SendError};

const READ_BUFFER_SIZE: usize = 8 * 1024;

const WRITE_BUFFER_SIZE: usize = 8 * 1024;

/// Size of one response body read, and of the chunk buffer before framing.
const RESPONSE_CONTENT_BUFFER_SIZE: usize = 4096;

/// Worst case framing around a chunk read into the content buffer: 4 hex
/// digits, two CRLFs and the final chunk.
const CHUNK_FRAMING_OVERHEAD: usize = 4 + 2 + 2 + FINAL_CHUNK.len();

const CHUNK_BUFFER_SIZE: usize = RESPONSE_CONTENT_BUFFER_SIZE - CHUNK_FRAMING_OVERHEAD;

/// Output buffered beyond this is flushed while a response body is copied.
const FLUSH_THRESHOLD: usize = 64 * 1024;

const DEFAULT_MAX_REQUEST_BODY: u64 = 1024 * 1024;

const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// State shared by every connection of a server.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    error_log: Arc<ErrorLogLimiter>,
    date: Option<Arc<DateService>>,
    max_request_body: u64,
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self { error_log: Arc::new(ErrorLogLimiter::default()), date: None, max_request_body: DEFAULT_MAX_REQUEST_BODY }
    }
}

impl ConnectionContext {
    pub fn new(error_log: Arc<ErrorLogLimiter>) -> Self {
        Self { error_log, ..Self::default() }
    }

    /// Adds a prepared `Date` line to responses that lack one.
    #[must_use]
    pub fn with_date_service(mut self, date: Arc<DateService>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_max_request_body(mut self, max_request_body: u64) -> Self {
        self.max_request_body = max_request_body;
        self
    }

    pub fn error_log(&self) -> &ErrorLogLimiter {
        &self.error_log
    }
}

/// Drives one client connection: read, parse, dispatch to the handler,
/// write the response, repeat.
///
/// Requests are served strictly in order. Every complete request found in
/// one read is answered before the output is flushed, so pipelined requests
/// share a single write. Any error ends the connection; nothing is retried
/// and no error response is generated.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
/// * `H`: The handler serving this connection's requests
#[derive(Debug)]
pub struct HttpConnection<R, W, H> {
    reader: RequestReader<R>,
    writer: ResponseWriter<W>,
    parser: RequestParser,
    framing: RequestFraming,
    handler: H,
    context: ConnectionContext,
    chunk_buffer: Box<[u8]>,
}

impl<R, W, H> HttpConnection<R, W, H>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    H: RequestHandler,
{
    pub fn new(reader: R, writer: W, handler: H, context: ConnectionContext) -> Self {
        Self {
            reader: RequestReader::with_capacity(reader, READ_BUFFER_SIZE),
            writer: ResponseWriter::with_capacity(writer, WRITE_BUFFER_SIZE),
            parser: RequestParser::new(),
            framing: RequestFraming::default(),
            handler,
            context,
            chunk_buffer: vec![0; CHUNK_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Serves requests until the peer closes, a request asks to close, or an
    /// error occurs. The write half is shut down in every case.
    pub async fn process(mut self) -> Result<(), HttpError> {
        let result = self.process_requests().await;

        if let Err(e) = self.writer.shutdown().await {
            trace!(cause = %e, "shutdown write half failed");
        }

        if let Err(e) = &result {
            if self.context.error_log.try_acquire() {
                error!(cause = %e, "connection aborted");
            } else {
                debug!(cause = %e, "connection aborted");
            }
        }

        result
    }

    async fn process_requests(&mut self) -> Result<(), HttpError> {
        loop {
            let read = self.reader.fill().await.map_err(ParseError::io)?;
            if read == 0 {
                if self.reader.buffer().is_empty() && self.parser.state() == ParseState::StartLine {
                    trace!("peer closed the connection");
                    return Ok(());
                }
                return Err(ParseError::UnexpectedEof.into());
            }

            loop {
                let mut events = FramingEvents { handler: &mut self.handler, framing: &mut self.framing };
                let progress = self.parser.parse(self.reader.buffer(), &mut events)?;
                self.reader.consume(progress.consumed);

                if self.parser.state() != ParseState::Body {
                    break;
                }

                let keep_alive = self.serve_request().await?;
                self.parser.reset();
                self.framing = RequestFraming::default();

                if !keep_alive {
                    self.writer.flush().await?;
                    return Ok(());
                }

                if self.reader.buffer().is_empty() {
                    break;
                }
            }

            self.writer.flush().await?;
        }
    }

    /// Reads the request body, runs the handler and writes its response.
    /// Returns whether the connection stays open.
    async fn serve_request(&mut self) -> Result<bool, HttpError> {
        let length = self.framing.content_length.unwrap_or(0);
        let max = self.context.max_request_body;
        ensure!(length <= max, ParseError::too_large_body(length, max).into());

        // bounded by max_request_body, which is far below usize::MAX
        let body = self.read_request_body(length as usize).await?;
        let http10 = self.framing.version == HttpVersion::Http10;
        let mut keep_alive = self.framing.keep_alive();

        let response = self.handler.process_request(body).await.map_err(HttpError::handler)?;

        // HTTP/1.0 clients cannot decode chunked bodies, closing the connection ends the body instead
        let unframed = http10 && response.is_chunked();
        if unframed {
            keep_alive = false;
        }

        let date_line = self.context.date.as_deref().map(DateService::date_line);
        let options = HeadOptions { date_line: date_line.as_deref(), unframed, keep_alive: http10 && keep_alive };
        write_response(&mut self.writer, &mut self.chunk_buffer, response, &options).await?;

        Ok(keep_alive)
    }

    async fn read_request_body(&mut self, length: usize) -> Result<Bytes, HttpError> {
        if length == 0 {
            return Ok(Bytes::new());
        }

        // an HTTP/1.0 expectation is ignored
        if self.framing.expect_continue && self.framing.version == HttpVersion::Http11 && self.reader.buffer().len() < length
        {
            let mut writer = BufferWriter::new(&mut self.writer);
            writer.write(CONTINUE_RESPONSE);
            writer.commit();
            debug!("received expect request header, sending continue response");
        }

        while self.reader.buffer().len() < length {
            // answers to earlier pipelined requests must not wait for this body
            self.writer.flush().await?;
            let read = self.reader.fill().await.map_err(ParseError::io)?;
            ensure!(read > 0, ParseError::UnexpectedEof.into());
        }

        Ok(self.reader.take(length))
    }
}

async fn write_response<W, B>(
    writer: &mut ResponseWriter<W>,
    chunk_buffer: &mut [u8],
    response: ResponseHead<B>,
    options: &HeadOptions<'_>,
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
    B: BodySource,
{
    ResponseEncoder::new().encode_head(&response, options, writer);

    let chunked = response.is_chunked() && !options.unframed;
    let mut body = response.into_body();
    if chunked {
        copy_chunked(writer, &mut body, chunk_buffer).await?;
    } else {
        copy_raw(writer, &mut body).await?;
    }
    Ok(())
}

/// Copies the body verbatim, reading straight into the output buffer.
///
/// A read that completes immediately costs no flush. Before waiting on a read
/// the output is flushed, the client gets what is available while the origin
/// is producing more.
async fn copy_raw<W, B>(writer: &mut ResponseWriter<W>, body: &mut B) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
    B: BodySource,
{
    loop {
        let ready = body.read(writer.window(RESPONSE_CONTENT_BUFFER_SIZE)).now_or_never();
        let read = match ready {
            Some(result) => result.map_err(SendError::body)?,
            None => {
                writer.flush().await?;
                body.read(writer.window(RESPONSE_CONTENT_BUFFER_SIZE)).await.map_err(SendError::body)?
            }
        };

        if read == 0 {
            return Ok(());
        }

        writer.advance(read);
        if writer.buffered() >= FLUSH_THRESHOLD {
            writer.flush().await?;
        }
    }
}

/// Copies the body as a sequence of chunks, one per read, followed by the
/// final chunk.
async fn copy_chunked<W, B>(writer: &mut ResponseWriter<W>, body: &mut B, chunk_buffer: &mut [u8]) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
    B: BodySource,
{
    loop {
        let ready = body.read(chunk_buffer).now_or_never();
        let read = match ready {
            Some(result) => result.map_err(SendError::body)?,
            None => {
                writer.flush().await?;
                body.read(chunk_buffer).await.map_err(SendError::body)?
            }
        };

        let mut buffer_writer = BufferWriter::with_size_hint(writer, read + CHUNK_FRAMING_OVERHEAD);
        if read == 0 {
            buffer_writer.write_final_chunk();
            buffer_writer.commit();
            return Ok(());
        }
        buffer_writer.write_chunked_frame(&chunk_buffer[..read]);
        buffer_writer.commit();

        if writer.buffered() >= FLUSH_THRESHOLD {
            writer.flush().await?;
        }
    }
}

/// What the pipeline itself needs to know about the request being parsed.
#[derive(Debug, Clone, Copy)]
struct RequestFraming {
    version: HttpVersion,
    content_length: Option<u64>,
    close: bool,
    keep_alive: bool,
    expect_continue: bool,
}

impl Default for RequestFraming {
    fn default() -> Self {
        Self {
            version: HttpVersion::Http11,
            content_length: None,
            close: false,
            keep_alive: false,
            expect_continue: false,
        }
    }
}

impl RequestFraming {
    fn keep_alive(&self) -> bool {
        match self.version {
            HttpVersion::Http11 => !self.close,
            HttpVersion::Http10 => self.keep_alive && !self.close,
        }
    }

    fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        if name.eq_ignore_ascii_case(b"content-length") {
            let length = parse_content_length(value)?;
            ensure!(
                self.content_length.is_none_or(|existing| existing == length),
                ParseError::invalid_content_length("conflicting content-length values")
            );
            self.content_length = Some(length);
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            return Err(ParseError::UnsupportedTransferEncoding);
        } else if name.eq_ignore_ascii_case(b"connection") {
            for token in value.split(|&b| b == b',').map(<[u8]>::trim_ascii) {
                if token.eq_ignore_ascii_case(b"close") {
                    self.close = true;
                } else if token.eq_ignore_ascii_case(b"keep-alive") {
                    self.keep_alive = true;
                }
            }
        } else if name.eq_ignore_ascii_case(b"expect") {
            self.expect_continue = value.trim_ascii().eq_ignore_ascii_case(b"100-continue");
        }
        Ok(())
    }
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    ensure!(
        !value.is_empty() && value.iter().all(u8::is_ascii_digit),
        ParseError::invalid_content_length(String::from_utf8_lossy(value))
    );
    value
        .iter()
        .try_fold(0u64, |acc, &b| acc.checked_mul(10)?.checked_add(u64::from(b - b'0')))
        .ok_or_else(|| ParseError::invalid_content_length("content-length overflow"))
}

/// Parser events seen by both the pipeline's framing state and the handler.
struct FramingEvents<'a, H> {
    handler: &'a mut H,
    framing: &'a mut RequestFraming,
}

impl<H: RequestHandler> ParseEvents for FramingEvents<'_, H> {
    fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError> {
        self.framing.version = line.version();
        self.handler.on_start_line(line)
    }

    fn on_header(&mut self, name: &[u8], value: &[u8]) -> Result<(), ParseError> {
        self.framing.on_header(name, value)?;
        self.handler.on_header(name, value)
    }

    fn on_headers_complete(&mut self) -> Result<(), ParseError> {
        self.handler.on_headers_complete()
    }
}

use std::cmp;
use std::io;

use bytes::{Bytes, BytesMut};
use micro_proxy_http::codec::{BufferSink, BufferWriter};
use micro_proxy_http::handler::BodySource;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Decoder;
use tracing::{debug, trace};
use triomphe::Arc;

use crate::downstream::DownstreamTarget;
use crate::origin::body::{BodyDecoder, BodyItem};
use crate::origin::head::ResponseHeadDecoder;
use crate::origin::{OriginClient, OriginError, OriginResponse, OutboundRequest};

const READ_BUFFER_SIZE: usize = 8 * 1024;
const MIN_READ_SPACE: usize = 1024;
const REQUEST_HEAD_SIZE_HINT: usize = 1024;

const HTTP_11_SUFFIX: &[u8] = b" HTTP/1.1\r\n";

/// An HTTP/1.1 client bound to one origin.
///
/// The connection is opened by [`connect`](Self::connect) and kept alive
/// across exchanges. When an exchange leaves it unusable, because the origin
/// asked to close, the body ran until close or it was not read to its end,
/// the next [`send`](OriginClient::send) opens a new one.
#[derive(Debug)]
pub struct Http1OriginClient<S = TcpStream> {
    target: Arc<DownstreamTarget>,
    connection: OriginConnection<S>,
    request_buffer: RequestBuffer,
}

#[derive(Debug)]
struct OriginConnection<S> {
    stream: S,
    read_buffer: BytesMut,
    /// no exchange in progress and the origin keeps the connection open
    idle: bool,
}

impl<S> OriginConnection<S> {
    fn new(stream: S) -> Self {
        Self { stream, read_buffer: BytesMut::with_capacity(READ_BUFFER_SIZE), idle: true }
    }
}

impl<S: AsyncRead + Unpin> OriginConnection<S> {
    async fn fill(&mut self) -> io::Result<usize> {
        if self.read_buffer.capacity() - self.read_buffer.len() < MIN_READ_SPACE {
            self.read_buffer.reserve(READ_BUFFER_SIZE);
        }
        self.stream.read_buf(&mut self.read_buffer).await
    }
}

impl Http1OriginClient<TcpStream> {
    /// Opens the connection to `target`.
    pub async fn connect(target: Arc<DownstreamTarget>) -> Result<Self, OriginError> {
        let stream = open(&target).await?;
        Ok(Self::with_stream(target, stream))
    }
}

impl<S> Http1OriginClient<S> {
    /// Uses an already open connection to `target`.
    pub fn with_stream(target: Arc<DownstreamTarget>, stream: S) -> Self {
        Self { target, connection: OriginConnection::new(stream), request_buffer: RequestBuffer::default() }
    }

    pub fn target(&self) -> &DownstreamTarget {
        &self.target
    }
}

async fn open(target: &DownstreamTarget) -> Result<TcpStream, OriginError> {
    let stream = TcpStream::connect((target.host(), target.port()))
        .await
        .map_err(|e| OriginError::connect(target.host(), target.port(), e))?;
    stream.set_nodelay(true)?;
    debug!(host = target.host(), port = target.port(), "connected to origin");
    Ok(stream)
}

/// How a client replaces a connection the previous exchange left unusable.
pub trait Reconnect: Sized {
    fn reconnect(target: &DownstreamTarget) -> impl Future<Output = Result<Self, OriginError>> + Send;
}

impl Reconnect for TcpStream {
    async fn reconnect(target: &DownstreamTarget) -> Result<Self, OriginError> {
        open(target).await
    }
}

#[cfg(test)]
impl Reconnect for tokio::io::DuplexStream {
    async fn reconnect(_target: &DownstreamTarget) -> Result<Self, OriginError> {
        Err(OriginError::UnexpectedEof)
    }
}

impl<S> OriginClient for Http1OriginClient<S>
where
    S: AsyncRead + AsyncWrite + Reconnect + Unpin + Send,
{
    type Body<'a>
        = OriginBody<'a, S>
    where
        Self: 'a;

    async fn send(&mut self, request: &OutboundRequest<'_>) -> Result<OriginResponse<OriginBody<'_, S>>, OriginError> {
        if !self.connection.idle {
            trace!(host = self.target.host(), "origin connection not reusable, reconnecting");
            self.connection = OriginConnection::new(S::reconnect(&self.target).await?);
        }
        let connection = &mut self.connection;
        connection.idle = false;

        encode_request(request, self.target.authority(), &mut self.request_buffer);
        connection.stream.write_all(self.request_buffer.take()).await?;
        if !request.body.is_empty() {
            connection.stream.write_all(&request.body).await?;
        }
        connection.stream.flush().await?;

        let mut head_decoder = ResponseHeadDecoder::new(request.is_head());
        let head = loop {
            if let Some(head) = head_decoder.decode(&mut connection.read_buffer)? {
                break head;
            }
            if connection.fill().await? == 0 {
                return Err(OriginError::UnexpectedEof);
            }
        };

        let body = OriginBody {
            connection,
            decoder: BodyDecoder::new(head.framing),
            pending: Bytes::new(),
            reusable: head.reusable,
            finished: false,
        };
        let mut response = OriginResponse::new(head.status, head.headers, body).with_chunked(head.chunked);
        if let Some(reason) = head.reason {
            response = response.with_reason(reason);
        }
        Ok(response)
    }
}

/// Writes the request head: request line, `Host`, the forwarded fields and
/// the body length.
pub fn encode_request<S: BufferSink>(request: &OutboundRequest<'_>, authority: &[u8], sink: &mut S) {
    let mut writer = BufferWriter::with_size_hint(sink, REQUEST_HEAD_SIZE_HINT);

    writer.write(request.method.as_bytes());
    writer.write_u8(b' ');
    writer.write(request.path_and_query);
    writer.write(HTTP_11_SUFFIX);

    writer.write_header(b"Host", authority);
    for header in request.headers {
        writer.write_header(header.name.as_bytes(), header.value.as_bytes());
    }

    if !request.body.is_empty() || expects_body(request.method) {
        writer.write(b"Content-Length: ");
        writer.write_decimal_u64(request.body.len() as u64);
        writer.write_crlf();
    }

    writer.write_crlf();
    writer.commit();
}

fn expects_body(method: &str) -> bool {
    matches!(method, "POST" | "PUT" | "PATCH")
}

/// The body of an origin response, decoded from the origin connection as it
/// is read.
#[derive(Debug)]
pub struct OriginBody<'a, S = TcpStream> {
    connection: &'a mut OriginConnection<S>,
    decoder: BodyDecoder,
    pending: Bytes,
    reusable: bool,
    finished: bool,
}

impl<S> OriginBody<'_, S> {
    fn finish(&mut self) {
        self.finished = true;
        self.connection.idle = self.reusable;
    }

    fn copy_pending(&mut self, buf: &mut [u8]) -> usize {
        let len = cmp::min(buf.len(), self.pending.len());
        buf[..len].copy_from_slice(&self.pending.split_to(len));
        len
    }
}

/// Cancel safe: the only await is a read into the connection buffer, all
/// decoding state changes happen between awaits.
impl<S: AsyncRead + Unpin + Send> BodySource for OriginBody<'_, S> {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if !self.pending.is_empty() {
                return Ok(self.copy_pending(buf));
            }
            if self.finished {
                return Ok(0);
            }

            match self.decoder.decode(&mut self.connection.read_buffer)? {
                Some(BodyItem::Chunk(bytes)) => self.pending = bytes,
                Some(BodyItem::Eof) => self.finish(),
                None => {
                    if self.connection.fill().await? == 0 {
                        match self.decoder.decode_eof(&mut self.connection.read_buffer)? {
                            Some(BodyItem::Chunk(bytes)) => self.pending = bytes,
                            Some(BodyItem::Eof) | None => self.finish(),
                        }
                    }
                }
            }
        }
    }
}

/// Output buffer for request heads.
#[derive(Debug, Default)]
struct RequestBuffer {
    buffer: Vec<u8>,
    committed: usize,
}

impl RequestBuffer {
    /// Hands out the committed bytes and rewinds.
    fn take(&mut self) -> &[u8] {
        let committed = self.committed;
        self.committed = 0;
        &self.buffer[..committed]
    }
}

impl BufferSink for RequestBuffer {
    fn window(&mut self, size_hint: usize) -> &mut [u8] {
        let wanted = size_hint.max(1);
        if self.buffer.len() - self.committed < wanted {
            self.buffer.resize(self.committed + wanted.max(REQUEST_HEAD_SIZE_HINT), 0);
        }
        &mut self.buffer[self.committed..]
    }

    fn advance(&mut self, count: usize) {
        debug_assert!(self.committed + count <= self.buffer.len());
        self.committed += count;
    }
}

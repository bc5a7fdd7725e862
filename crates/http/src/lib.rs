//! The pipelining core of micro-proxy.
//!
//! This crate turns a byte stream from a client into a sequence of requests
//! and a byte stream back into responses, with as little work per request as
//! possible. It knows nothing about where responses come from: a
//! [`handler::RequestHandler`] supplies them, the `micro-proxy` crate plugs in
//! one that forwards to an origin server.
//!
//! # Features
//!
//! - HTTP/1.1 pipelining: every request found in one read is answered before
//!   a single flush
//! - Incremental request parsing that resumes across reads without rescanning
//! - Response bodies copied verbatim or re-framed with chunked encoding
//! - A cursor over caller supplied buffers for writing protocol text without
//!   per-write length checks
//! - HPACK primitive codecs (RFC 7541): integers, strings, static table and
//!   field representations
//! - Interned known header names with fast case-sensitive lookup
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::StatusCode;
//! use micro_proxy_http::connection::{ConnectionContext, HttpConnection};
//! use micro_proxy_http::handler::{BytesBody, RequestHandler};
//! use micro_proxy_http::protocol::{ParseError, RequestLine, ResponseHead, ResponseHeaders};
//! use std::io;
//! use tokio::net::TcpListener;
//! use tracing::{info, warn};
//!
//! struct HelloWorld;
//!
//! impl RequestHandler for HelloWorld {
//!     type Body<'a> = BytesBody;
//!     type Error = io::Error;
//!
//!     fn on_start_line(&mut self, line: &RequestLine<'_>) -> Result<(), ParseError> {
//!         info!(target = %String::from_utf8_lossy(line.target()), "receiving request");
//!         Ok(())
//!     }
//!
//!     fn on_header(&mut self, _name: &[u8], _value: &[u8]) -> Result<(), ParseError> {
//!         Ok(())
//!     }
//!
//!     async fn process_request(&mut self, _body: Bytes) -> Result<ResponseHead<BytesBody>, io::Error> {
//!         let body = "Hello World!\r\n";
//!         let headers = ResponseHeaders::builder().header("Content-Length", body.len().to_string()).build();
//!         Ok(ResponseHead::new(StatusCode::OK, headers, BytesBody::new(Bytes::from_static(body.as_bytes()))))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let context = ConnectionContext::default();
//!
//!     loop {
//!         let (stream, _remote_addr) = match listener.accept().await {
//!             Ok(accepted) => accepted,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let context = context.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = stream.into_split();
//!             let _ = HttpConnection::new(reader, writer, HelloWorld, context).process().await;
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: the per-connection read, parse, serve and flush loop
//! - [`codec`]: request parser, response head encoder, buffer writer and the
//!   known header table
//! - [`handler`]: the contract between the pipeline and what serves requests
//! - [`protocol`]: request line, response head and error types
//! - [`hpack`]: RFC 7541 primitive codecs
//! - [`date`]: the shared, periodically refreshed `Date` line
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only, without TLS
//! - Request bodies must be framed by `Content-Length`
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod date;
pub mod handler;
pub mod hpack;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;

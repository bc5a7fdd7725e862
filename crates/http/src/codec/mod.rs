//! Wire level building blocks of the pipeline.
//!
//! - [`RequestParser`]: incremental request line and header parser driving
//!   [`ParseEvents`]
//! - [`BufferWriter`]: write cursor over a [`BufferSink`], with decimal, hex
//!   and chunk framing helpers
//! - [`ResponseEncoder`]: status line and header serialization
//! - [`header::known`]: interned well known header names and values

mod buffer_writer;
pub mod header;
mod request_parser;
mod response_encoder;

pub use buffer_writer::{BufferSink, BufferWriter, FINAL_CHUNK, MAX_CHUNK_FRAMING};
pub use request_parser::{MAX_HEADER_BYTES, MAX_HEADER_NUM, ParseEvents, ParseState, Progress, RequestParser};
pub use response_encoder::{HeadOptions, ResponseEncoder};

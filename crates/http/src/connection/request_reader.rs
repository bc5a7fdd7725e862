use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Smallest free space offered to a single read.
const MIN_READ_SPACE: usize = 1024;

/// Read half of a connection with its input buffer.
///
/// Bytes stay in the buffer until the pipeline consumes them, so a request
/// head split over several reads is seen as one contiguous slice.
#[derive(Debug)]
pub struct RequestReader<R> {
    reader: R,
    buffer: BytesMut,
    capacity: usize,
}

impl<R> RequestReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, buffer: BytesMut::with_capacity(capacity), capacity }
    }

    /// Unconsumed input.
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Reads once from the underlying stream, appending to the buffer.
    /// Returns `0` at end of stream.
    pub async fn fill(&mut self) -> io::Result<usize> {
        if self.buffer.capacity() - self.buffer.len() < MIN_READ_SPACE {
            self.buffer.reserve(self.capacity);
        }
        self.reader.read_buf(&mut self.buffer).await
    }

    /// Drops `count` processed bytes from the front of the buffer.
    #[inline]
    pub fn consume(&mut self, count: usize) {
        self.buffer.advance(count);
    }

    /// Takes the next `count` buffered bytes out as a request body.
    pub fn take(&mut self, count: usize) -> Bytes {
        self.buffer.split_to(count).freeze()
    }
}

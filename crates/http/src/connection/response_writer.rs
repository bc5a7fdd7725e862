use crate::codec::BufferSink;
use crate::protocol::SendError;
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Smallest window handed out to writers and in place reads.
const MIN_WINDOW: usize = 4 * 1024;

/// Write half of a connection with its output buffer.
///
/// Implements [`BufferSink`]: the window is the buffer's space after the
/// committed bytes, grown and zero filled on demand. Flushing writes the
/// committed bytes and rewinds, keeping the allocation and its initialized
/// space for the next batch.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    buffer: BytesMut,
    committed: usize,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), committed: 0 }
    }

    /// Committed bytes waiting for a flush.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.committed
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.committed == 0 {
            return Ok(());
        }

        self.writer.write_all(&self.buffer[..self.committed]).await?;
        self.committed = 0;
        Ok(self.writer.flush().await?)
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

impl<W> BufferSink for ResponseWriter<W> {
    fn window(&mut self, size_hint: usize) -> &mut [u8] {
        let wanted = size_hint.max(1);
        if self.buffer.len() - self.committed < wanted {
            self.buffer.resize(self.committed + wanted.max(MIN_WINDOW), 0);
        }
        &mut self.buffer[self.committed..]
    }

    #[inline]
    fn advance(&mut self, count: usize) {
        debug_assert!(self.committed + count <= self.buffer.len());
        self.committed += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BufferWriter;

    #[tokio::test]
    async fn test_commit_then_flush() {
        let mut writer = ResponseWriter::with_capacity(Vec::new(), 16);
        {
            let mut buffer_writer = BufferWriter::new(&mut writer);
            buffer_writer.write(b"HTTP/1.1 200 OK\r\n\r\n");
            buffer_writer.commit();
        }
        assert_eq!(writer.buffered(), 19);

        writer.flush().await.unwrap();
        assert_eq!(writer.buffered(), 0);
        assert_eq!(writer.get_mut().as_slice(), b"HTTP/1.1 200 OK\r\n\r\n");

        // the window is reused after a flush
        let window = writer.window(0);
        assert!(window.len() >= MIN_WINDOW);
        window[..2].copy_from_slice(b"ok");
        writer.advance(2);
        writer.flush().await.unwrap();
        assert_eq!(writer.get_mut().as_slice(), b"HTTP/1.1 200 OK\r\n\r\nok");
    }

    #[tokio::test]
    async fn test_flush_without_data_is_noop() {
        let mut writer = ResponseWriter::with_capacity(Vec::new(), 16);
        writer.flush().await.unwrap();
        assert!(writer.get_mut().is_empty());
    }
}

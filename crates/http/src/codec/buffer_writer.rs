//! A write cursor over a windowed output sink.
//!
//! [`BufferSink`] hands out a writable window past its committed data.
//! [`BufferWriter`] copies into that window, counting what it wrote, and
//! only tells the sink about it on [`BufferWriter::commit`]. When a write does
//! not fit, the writer commits what it has and asks the sink for a fresh
//! window, so a single logical write may span several windows.

use std::cmp;

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Maximum framing bytes around one chunk: 8 hex digits for a `u32` length
/// and two CRLFs.
pub const MAX_CHUNK_FRAMING: usize = 8 + 2 + 2;

/// The terminating chunk of a chunked body, without trailers.
pub const FINAL_CHUNK: &[u8] = b"0\r\n\r\n";

/// An output buffer that exposes its free space as a writable window.
///
/// Implementations must return a window of at least `max(size_hint, 1)` bytes
/// starting right after the committed data, and must keep the content of a
/// previously returned window until it is committed through
/// [`BufferSink::advance`].
pub trait BufferSink {
    fn window(&mut self, size_hint: usize) -> &mut [u8];

    /// Marks `count` bytes at the start of the window as written.
    fn advance(&mut self, count: usize);
}

#[derive(Debug)]
pub struct BufferWriter<'a, S: BufferSink> {
    sink: &'a mut S,
    /// bytes written into the current window but not committed
    buffered: usize,
    /// length of the current window, including `buffered`
    available: usize,
}

impl<'a, S: BufferSink> BufferWriter<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self::with_size_hint(sink, 0)
    }

    pub fn with_size_hint(sink: &'a mut S, size_hint: usize) -> Self {
        let available = sink.window(size_hint).len();
        Self { sink, buffered: 0, available }
    }

    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    /// Bytes still free in the current window.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.available - self.buffered
    }

    /// The free part of the current window, for callers that want to produce
    /// bytes in place. Follow up with [`BufferWriter::advance`].
    #[inline]
    pub fn span(&mut self) -> &mut [u8] {
        let start = self.buffered;
        let end = self.available;
        &mut self.sink.window(0)[start..end]
    }

    /// Accounts for `count` bytes written through [`BufferWriter::span`].
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`BufferWriter::remaining`].
    #[inline]
    pub fn advance(&mut self, count: usize) {
        assert!(count <= self.remaining(), "advance {count} past the end of the window");
        self.buffered += count;
    }

    /// Hands the buffered bytes over to the sink. Does nothing when nothing
    /// is buffered.
    #[inline]
    pub fn commit(&mut self) {
        if self.buffered > 0 {
            self.sink.advance(self.buffered);
            self.available -= self.buffered;
            self.buffered = 0;
        }
    }

    /// Makes sure at least `count` contiguous bytes are free, committing and
    /// requesting a new window if needed.
    #[inline]
    pub fn ensure(&mut self, count: usize) {
        if self.remaining() < count {
            self.refill(count);
        }
    }

    fn refill(&mut self, size_hint: usize) {
        self.commit();
        self.available = self.sink.window(size_hint).len();
    }

    #[inline]
    pub fn write(&mut self, src: &[u8]) {
        if src.len() <= self.remaining() {
            self.write_no_length_check(src);
        } else {
            self.write_multi_buffer(src);
        }
    }

    /// Copies `src` into the current window. The caller must have made room
    /// with [`BufferWriter::ensure`] or checked [`BufferWriter::remaining`].
    #[inline]
    pub fn write_no_length_check(&mut self, src: &[u8]) {
        let start = self.buffered;
        self.sink.window(0)[start..start + src.len()].copy_from_slice(src);
        self.buffered += src.len();
    }

    fn write_multi_buffer(&mut self, mut src: &[u8]) {
        while !src.is_empty() {
            if self.remaining() == 0 {
                self.refill(src.len());
            }
            let len = cmp::min(self.remaining(), src.len());
            self.write_no_length_check(&src[..len]);
            src = &src[len..];
        }
    }

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.ensure(1);
        self.write_no_length_check(&[byte]);
    }

    #[inline]
    pub fn write_crlf(&mut self) {
        self.write(b"\r\n");
    }

    /// Writes `value` in ASCII decimal.
    ///
    /// Three digit values, which covers every status code, skip the division
    /// loop: `n * 41 >> 12` equals `n / 100` for `n < 1000` and
    /// `n * 205 >> 11` equals `n / 10` for `n < 1029`.
    pub fn write_decimal(&mut self, value: u32) {
        if (100..1000).contains(&value) {
            let hundreds = (value * 41) >> 12;
            let rest = value - hundreds * 100;
            let tens = (rest * 205) >> 11;
            let ones = rest - tens * 10;

            self.ensure(3);
            self.write_no_length_check(&[b'0' + hundreds as u8, b'0' + tens as u8, b'0' + ones as u8]);
            return;
        }

        let mut scratch = [0u8; 10];
        let mut pos = scratch.len();
        let mut rest = value;
        loop {
            pos -= 1;
            scratch[pos] = b'0' + (rest % 10) as u8;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        self.write(&scratch[pos..]);
    }

    /// Writes a `u64` in ASCII decimal, for lengths that may exceed `u32`.
    pub fn write_decimal_u64(&mut self, value: u64) {
        if let Ok(small) = u32::try_from(value) {
            self.write_decimal(small);
            return;
        }

        let mut scratch = [0u8; 20];
        let mut pos = scratch.len();
        let mut rest = value;
        while rest != 0 {
            pos -= 1;
            scratch[pos] = b'0' + (rest % 10) as u8;
            rest /= 10;
        }
        self.write(&scratch[pos..]);
    }

    /// Writes `value` in upper case hex without leading zeros.
    pub fn write_hex(&mut self, value: u32) {
        let mut scratch = [0u8; 8];
        let mut pos = scratch.len();
        let mut rest = value;
        loop {
            pos -= 1;
            scratch[pos] = UPPER_HEX[(rest & 0xF) as usize];
            rest >>= 4;
            if rest == 0 {
                break;
            }
        }
        self.write(&scratch[pos..]);
    }

    /// Writes `<hex length>\r\n<chunk>\r\n`. Empty chunks are skipped, an
    /// empty frame would terminate the body.
    pub fn write_chunked_frame(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        if let Ok(len) = u32::try_from(chunk.len()) {
            if chunk.len() + MAX_CHUNK_FRAMING <= self.remaining() {
                self.write_hex(len);
                self.write_no_length_check(b"\r\n");
                self.write_no_length_check(chunk);
                self.write_no_length_check(b"\r\n");
                return;
            }
        }

        self.write_chunked_frame_slow(chunk);
    }

    fn write_chunked_frame_slow(&mut self, chunk: &[u8]) {
        // frames larger than u32::MAX are split, everything else keeps one
        // frame and lets `write` span windows
        for part in chunk.chunks(u32::MAX as usize) {
            self.write_hex(part.len() as u32);
            self.write_crlf();
            self.write(part);
            self.write_crlf();
        }
    }

    #[inline]
    pub fn write_final_chunk(&mut self) {
        self.write(FINAL_CHUNK);
    }

    #[inline]
    pub fn write_header(&mut self, name: &[u8], value: &[u8]) {
        self.write(name);
        self.write(b": ");
        self.write(value);
        self.write_crlf();
    }
}

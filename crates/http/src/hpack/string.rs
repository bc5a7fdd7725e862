//! String literal representation, [RFC 7541 Section 5.2](https://www.rfc-editor.org/rfc/rfc7541#section-5.2).
//!
//! Only raw octets are produced. The Huffman flag of decoded literals is
//! reported to the caller, the octets themselves are returned untouched.

use super::integer::{decode_integer, encode_integer};
use crate::protocol::HpackError;

const HUFFMAN_FLAG: u8 = 0x80;
const LENGTH_MASK: u8 = 0x7F;

/// A string literal borrowed from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedString<'a> {
    pub value: &'a [u8],
    pub huffman_coded: bool,
    pub consumed: usize,
}

/// Writes `value` as a non Huffman coded literal, returning the bytes used
/// or `None` if `buf` is too small.
pub fn encode_string(value: &[u8], buf: &mut [u8]) -> Option<usize> {
    let prefix_len = encode_integer(value.len() as u64, 0, LENGTH_MASK, buf)?;
    let end = prefix_len.checked_add(value.len())?;
    buf.get_mut(prefix_len..end)?.copy_from_slice(value);
    Some(end)
}

/// Reads a string literal from the start of `buf`.
///
/// Returns `Ok(None)` when either the length prefix or the octets are
/// incomplete.
pub fn decode_string(buf: &[u8]) -> Result<Option<DecodedString<'_>>, HpackError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };

    let Some((length, prefix_len)) = decode_integer(LENGTH_MASK, buf)? else {
        return Ok(None);
    };

    let length = usize::try_from(length).map_err(|_e| HpackError::IntegerOverflow)?;
    let end = prefix_len.checked_add(length).ok_or(HpackError::IntegerOverflow)?;

    Ok(buf.get(prefix_len..end).map(|value| DecodedString {
        value,
        huffman_coded: first & HUFFMAN_FLAG != 0,
        consumed: end,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_custom_key() {
        let mut buf = [0u8; 32];
        let len = encode_string(b"custom-key", &mut buf).unwrap();
        assert_eq!(&buf[..len], b"\x0acustom-key");
    }

    #[test]
    fn test_decode_borrows_input() {
        let input = b"\x0acustom-keytrailing";
        let decoded = decode_string(input).unwrap().unwrap();
        assert_eq!(decoded.value, b"custom-key");
        assert_eq!(decoded.consumed, 11);
        assert!(!decoded.huffman_coded);
    }

    #[test]
    fn test_long_literal_uses_continuation() {
        let value = vec![b'a'; 300];
        let mut buf = vec![0u8; 310];
        let len = encode_string(&value, &mut buf).unwrap();
        assert_eq!(len, 303);
        assert_eq!(&buf[..3], &[0x7F, 0xAD, 0x01]);

        let decoded = decode_string(&buf[..len]).unwrap().unwrap();
        assert_eq!(decoded.value, &value[..]);
    }

    #[test]
    fn test_huffman_flag_surfaced() {
        // "www.example.com" huffman coded, RFC 7541 C.4.1
        let input = [0x8C, 0xF1, 0xE3, 0xC2, 0xE5, 0xF2, 0x3A, 0x6B, 0xA0, 0xAB, 0x90, 0xF4, 0xFF];
        let decoded = decode_string(&input).unwrap().unwrap();
        assert!(decoded.huffman_coded);
        assert_eq!(decoded.value.len(), 12);
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(decode_string(b""), Ok(None));
        assert_eq!(decode_string(b"\x05abc"), Ok(None));

        let mut small = [0u8; 4];
        assert_eq!(encode_string(b"abcd", &mut small), None);
    }

    #[test]
    fn test_round_trip_every_length() {
        let source: Vec<u8> = (0..10_000u32).map(|i| b'a' + (i % 26) as u8).collect();
        // garbage, so a length prefix that is not written shows up
        let mut buf = vec![0xFF; 10_000 + 3];

        for len in 0..10_000 {
            buf.fill(0xFF);
            let value = &source[..len];
            let written = encode_string(value, &mut buf).unwrap();

            let decoded = decode_string(&buf[..written]).unwrap().unwrap();
            assert_eq!(decoded.value, value, "length {len}");
            assert_eq!(decoded.consumed, written);
            assert!(!decoded.huffman_coded);
        }
    }
}

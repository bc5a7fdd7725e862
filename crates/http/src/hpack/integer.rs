//! Prefixed integer representation, [RFC 7541 Section 5.1](https://www.rfc-editor.org/rfc/rfc7541#section-5.1).
//!
//! An integer is stored in the low `N` bits of a first byte whose high bits
//! carry a representation flag (`prefix_value`). Values that do not fit in the
//! prefix set all prefix bits and continue in 7-bit little-endian groups, the
//! high bit of each group byte marking continuation.

use crate::protocol::HpackError;

/// Encodes `value` using the prefix selected by `prefix_mask`, ORing
/// `prefix_value` into the first byte.
///
/// Returns the number of bytes written, or `None` if `buf` is too small. A
/// `None` result leaves the content of `buf` unspecified; the caller retries
/// with a larger buffer.
///
/// # Example
///
/// ```
/// use micro_proxy_http::hpack::encode_integer;
///
/// let mut buf = [0u8; 8];
/// assert_eq!(encode_integer(1337, 0x00, 0x1F, &mut buf), Some(3));
/// assert_eq!(&buf[..3], &[0x1F, 0x9A, 0x0A]);
/// ```
pub fn encode_integer(value: u64, prefix_value: u8, prefix_mask: u8, buf: &mut [u8]) -> Option<usize> {
    let first = buf.first_mut()?;
    let mask = u64::from(prefix_mask);

    if value < mask {
        // value < mask <= 0xFF, the cast cannot truncate
        *first = prefix_value | value as u8;
        return Some(1);
    }

    *first = prefix_value | prefix_mask;
    let mut remaining = value - mask;
    let mut written = 1;

    while remaining >= 0x80 {
        let slot = buf.get_mut(written)?;
        *slot = (remaining & 0x7F) as u8 | 0x80;
        remaining >>= 7;
        written += 1;
    }

    let slot = buf.get_mut(written)?;
    *slot = remaining as u8;
    Some(written + 1)
}

/// Decodes an integer whose prefix occupies the bits of `prefix_mask`.
///
/// # Returns
///
/// - `Ok(Some((value, consumed)))` when a complete integer was read
/// - `Ok(None)` when `buf` ends before the integer does
/// - `Err(HpackError::OverlongInteger)` when the encoding ends with a
///   redundant zero group (the form `[mask, 0x00]` for `value == mask` is the
///   canonical one and is accepted)
/// - `Err(HpackError::IntegerOverflow)` when the value exceeds `u64::MAX`
pub fn decode_integer(prefix_mask: u8, buf: &[u8]) -> Result<Option<(u64, usize)>, HpackError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };

    let prefix = first & prefix_mask;
    if prefix < prefix_mask {
        return Ok(Some((u64::from(prefix), 1)));
    }

    let mut value = u64::from(prefix_mask);
    let mut shift = 0u32;

    for (i, &byte) in buf.iter().enumerate().skip(1) {
        let group = u64::from(byte & 0x7F);

        if byte == 0 && i > 1 {
            return Err(HpackError::OverlongInteger);
        }

        if shift >= u64::BITS || group > (u64::MAX >> shift) {
            return Err(HpackError::IntegerOverflow);
        }
        value = value.checked_add(group << shift).ok_or(HpackError::IntegerOverflow)?;

        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
        shift += 7;
    }

    Ok(None)
}

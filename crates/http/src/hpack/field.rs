//! Header field representations, [RFC 7541 Section 6](https://www.rfc-editor.org/rfc/rfc7541#section-6).
//!
//! Encoders write a single representation into a caller supplied slice and
//! return `None` when it does not fit. [`decode_field`] reads one
//! representation and borrows names and values from the input.

use super::integer::{decode_integer, encode_integer};
use super::string::{DecodedString, decode_string, encode_string};
use crate::protocol::HpackError;

const INDEXED_PREFIX: u8 = 0x80;
const INDEXED_MASK: u8 = 0x7F;

const INCREMENTAL_INDEXING_PREFIX: u8 = 0x40;
const INCREMENTAL_INDEXING_MASK: u8 = 0x3F;

const TABLE_SIZE_UPDATE_PREFIX: u8 = 0x20;
const TABLE_SIZE_UPDATE_MASK: u8 = 0x1F;

const NEVER_INDEXED_PREFIX: u8 = 0x10;
const WITHOUT_INDEXING_PREFIX: u8 = 0x00;
const LITERAL_MASK: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    IncrementalIndexing,
    WithoutIndexing,
    NeverIndexed,
}

impl LiteralKind {
    const fn prefix(self) -> (u8, u8) {
        match self {
            Self::IncrementalIndexing => (INCREMENTAL_INDEXING_PREFIX, INCREMENTAL_INDEXING_MASK),
            Self::WithoutIndexing => (WITHOUT_INDEXING_PREFIX, LITERAL_MASK),
            Self::NeverIndexed => (NEVER_INDEXED_PREFIX, LITERAL_MASK),
        }
    }
}

/// Name part of a literal representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName<'a> {
    Indexed(u64),
    Literal(&'a [u8]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField<'a> {
    Indexed(u64),
    Literal { kind: LiteralKind, name: FieldName<'a>, value: &'a [u8], huffman_coded: bool },
    TableSizeUpdate(u64),
}

pub fn encode_indexed(index: u64, buf: &mut [u8]) -> Option<usize> {
    encode_integer(index, INDEXED_PREFIX, INDEXED_MASK, buf)
}

pub fn encode_table_size_update(size: u64, buf: &mut [u8]) -> Option<usize> {
    encode_integer(size, TABLE_SIZE_UPDATE_PREFIX, TABLE_SIZE_UPDATE_MASK, buf)
}

/// Writes a literal header field. An indexed name must be non zero, index
/// zero in the prefix is how a literal name is signalled.
pub fn encode_literal(kind: LiteralKind, name: FieldName<'_>, value: &[u8], buf: &mut [u8]) -> Option<usize> {
    let (prefix_value, prefix_mask) = kind.prefix();

    let mut written = match name {
        FieldName::Indexed(index) => encode_integer(index, prefix_value, prefix_mask, buf)?,
        FieldName::Literal(name) => {
            let head = encode_integer(0, prefix_value, prefix_mask, buf)?;
            head + encode_string(name, buf.get_mut(head..)?)?
        }
    };

    written += encode_string(value, buf.get_mut(written..)?)?;
    Some(written)
}

/// Decodes one header field representation.
///
/// Returns `Ok(None)` if `buf` holds only part of a representation.
pub fn decode_field(buf: &[u8]) -> Result<Option<(HeaderField<'_>, usize)>, HpackError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };

    if first & INDEXED_PREFIX != 0 {
        let Some((index, consumed)) = decode_integer(INDEXED_MASK, buf)? else {
            return Ok(None);
        };
        if index == 0 {
            return Err(HpackError::InvalidRepresentation);
        }
        return Ok(Some((HeaderField::Indexed(index), consumed)));
    }

    if first & INCREMENTAL_INDEXING_PREFIX != 0 {
        return decode_literal(LiteralKind::IncrementalIndexing, INCREMENTAL_INDEXING_MASK, buf);
    }

    if first & TABLE_SIZE_UPDATE_PREFIX != 0 {
        return Ok(decode_integer(TABLE_SIZE_UPDATE_MASK, buf)?
            .map(|(size, consumed)| (HeaderField::TableSizeUpdate(size), consumed)));
    }

    let kind = if first & NEVER_INDEXED_PREFIX != 0 { LiteralKind::NeverIndexed } else { LiteralKind::WithoutIndexing };
    decode_literal(kind, LITERAL_MASK, buf)
}

fn decode_literal(kind: LiteralKind, prefix_mask: u8, buf: &[u8]) -> Result<Option<(HeaderField<'_>, usize)>, HpackError> {
    let Some((index, mut consumed)) = decode_integer(prefix_mask, buf)? else {
        return Ok(None);
    };

    let name = if index == 0 {
        let Some(DecodedString { value, consumed: name_len, .. }) = decode_string(&buf[consumed..])? else {
            return Ok(None);
        };
        consumed += name_len;
        FieldName::Literal(value)
    } else {
        FieldName::Indexed(index)
    };

    let Some(value) = decode_string(&buf[consumed..])? else {
        return Ok(None);
    };
    consumed += value.consumed;

    Ok(Some((HeaderField::Literal { kind, name, value: value.value, huffman_coded: value.huffman_coded }, consumed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpack::static_header;

    #[test]
    fn test_indexed_status_200() {
        let mut buf = [0u8; 4];
        let len = encode_indexed(8, &mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x88]);

        let (field, consumed) = decode_field(&buf[..len]).unwrap().unwrap();
        assert_eq!(consumed, 1);
        let HeaderField::Indexed(index) = field else { panic!("expect indexed field") };
        assert_eq!(static_header(index).unwrap().value, "200");
    }

    #[test]
    fn test_literal_with_indexing_new_name() {
        // RFC 7541 C.2.1
        let mut buf = [0u8; 64];
        let len =
            encode_literal(LiteralKind::IncrementalIndexing, FieldName::Literal(b"custom-key"), b"custom-header", &mut buf)
                .unwrap();
        assert_eq!(&buf[..len], b"\x40\x0acustom-key\x0dcustom-header");

        let (field, consumed) = decode_field(&buf[..len]).unwrap().unwrap();
        assert_eq!(consumed, len);
        assert_eq!(
            field,
            HeaderField::Literal {
                kind: LiteralKind::IncrementalIndexing,
                name: FieldName::Literal(b"custom-key"),
                value: b"custom-header",
                huffman_coded: false,
            }
        );
    }

    #[test]
    fn test_literal_without_indexing_indexed_name() {
        // RFC 7541 C.2.2
        let mut buf = [0u8; 64];
        let len = encode_literal(LiteralKind::WithoutIndexing, FieldName::Indexed(4), b"/sample/path", &mut buf).unwrap();
        assert_eq!(&buf[..len], b"\x04\x0c/sample/path");
    }

    #[test]
    fn test_never_indexed() {
        // RFC 7541 C.2.3
        let input = b"\x10\x08password\x06secret";
        let (field, consumed) = decode_field(input).unwrap().unwrap();
        assert_eq!(consumed, input.len());
        assert!(matches!(
            field,
            HeaderField::Literal { kind: LiteralKind::NeverIndexed, name: FieldName::Literal(b"password"), value: b"secret", .. }
        ));
    }

    #[test]
    fn test_table_size_update() {
        let mut buf = [0u8; 4];
        let len = encode_table_size_update(4096, &mut buf).unwrap();
        assert_eq!(decode_field(&buf[..len]).unwrap(), Some((HeaderField::TableSizeUpdate(4096), len)));
    }

    #[test]
    fn test_partial_and_invalid() {
        assert_eq!(decode_field(b"\x40\x0acustom"), Ok(None));
        assert_eq!(decode_field(b"\x80"), Err(HpackError::InvalidRepresentation));

        let mut small = [0u8; 8];
        assert_eq!(encode_literal(LiteralKind::WithoutIndexing, FieldName::Indexed(4), b"/sample/path", &mut small), None);
    }
}

//! HPACK primitives ([RFC 7541](https://www.rfc-editor.org/rfc/rfc7541)).
//!
//! The proxy only needs the stateless parts of HPACK: prefixed integers,
//! string literals, the static table and the header field representations
//! built on them. Huffman coding and the dynamic table are not implemented;
//! the Huffman flag of decoded literals is surfaced so callers can reject or
//! pass such literals through.

mod field;
mod integer;
mod static_table;
mod string;

pub use field::{FieldName, HeaderField, LiteralKind, decode_field, encode_indexed, encode_literal, encode_table_size_update};
pub use integer::{decode_integer, encode_integer};
pub use static_table::{STATIC_TABLE_LEN, StaticHeader, StaticMatch, find_static, static_header};
pub use string::{DecodedString, decode_string, encode_string};

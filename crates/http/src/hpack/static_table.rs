//! The HPACK static table, [RFC 7541 Appendix A](https://www.rfc-editor.org/rfc/rfc7541#appendix-A).

use crate::protocol::HpackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHeader {
    pub name: &'static str,
    pub value: &'static str,
}

impl StaticHeader {
    const fn new(name: &'static str, value: &'static str) -> Self {
        Self { name, value }
    }
}

/// Number of entries in the static table.
pub const STATIC_TABLE_LEN: usize = 61;

static STATIC_TABLE: [StaticHeader; STATIC_TABLE_LEN] = [
    StaticHeader::new(":authority", ""),
    StaticHeader::new(":method", "GET"),
    StaticHeader::new(":method", "POST"),
    StaticHeader::new(":path", "/"),
    StaticHeader::new(":path", "/index.html"),
    StaticHeader::new(":scheme", "http"),
    StaticHeader::new(":scheme", "https"),
    StaticHeader::new(":status", "200"),
    StaticHeader::new(":status", "204"),
    StaticHeader::new(":status", "206"),
    StaticHeader::new(":status", "304"),
    StaticHeader::new(":status", "400"),
    StaticHeader::new(":status", "404"),
    StaticHeader::new(":status", "500"),
    StaticHeader::new("accept-charset", ""),
    StaticHeader::new("accept-encoding", "gzip, deflate"),
    StaticHeader::new("accept-language", ""),
    StaticHeader::new("accept-ranges", ""),
    StaticHeader::new("accept", ""),
    StaticHeader::new("access-control-allow-origin", ""),
    StaticHeader::new("age", ""),
    StaticHeader::new("allow", ""),
    StaticHeader::new("authorization", ""),
    StaticHeader::new("cache-control", ""),
    StaticHeader::new("content-disposition", ""),
    StaticHeader::new("content-encoding", ""),
    StaticHeader::new("content-language", ""),
    StaticHeader::new("content-length", ""),
    StaticHeader::new("content-location", ""),
    StaticHeader::new("content-range", ""),
    StaticHeader::new("content-type", ""),
    StaticHeader::new("cookie", ""),
    StaticHeader::new("date", ""),
    StaticHeader::new("etag", ""),
    StaticHeader::new("expect", ""),
    StaticHeader::new("expires", ""),
    StaticHeader::new("from", ""),
    StaticHeader::new("host", ""),
    StaticHeader::new("if-match", ""),
    StaticHeader::new("if-modified-since", ""),
    StaticHeader::new("if-none-match", ""),
    StaticHeader::new("if-range", ""),
    StaticHeader::new("if-unmodified-since", ""),
    StaticHeader::new("last-modified", ""),
    StaticHeader::new("link", ""),
    StaticHeader::new("location", ""),
    StaticHeader::new("max-forwards", ""),
    StaticHeader::new("proxy-authenticate", ""),
    StaticHeader::new("proxy-authorization", ""),
    StaticHeader::new("range", ""),
    StaticHeader::new("referer", ""),
    StaticHeader::new("refresh", ""),
    StaticHeader::new("retry-after", ""),
    StaticHeader::new("server", ""),
    StaticHeader::new("set-cookie", ""),
    StaticHeader::new("strict-transport-security", ""),
    StaticHeader::new("transfer-encoding", ""),
    StaticHeader::new("user-agent", ""),
    StaticHeader::new("vary", ""),
    StaticHeader::new("via", ""),
    StaticHeader::new("www-authenticate", ""),
];

/// Looks up a static entry by its 1-based index.
pub fn static_header(index: u64) -> Result<&'static StaticHeader, HpackError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| STATIC_TABLE.get(i))
        .ok_or(HpackError::InvalidStaticIndex { index })
}

/// Result of searching the static table for a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticMatch {
    /// name and value both match the entry at this index
    Field(u64),
    /// only the name matches, the first such entry is returned
    Name(u64),
}

/// Finds the best static entry for `name: value`; `name` must already be
/// lower case, as HPACK requires.
pub fn find_static(name: &[u8], value: &[u8]) -> Option<StaticMatch> {
    let mut name_match = None;
    for (i, entry) in STATIC_TABLE.iter().enumerate() {
        if entry.name.as_bytes() != name {
            continue;
        }
        let index = i as u64 + 1;
        if entry.value.as_bytes() == value {
            return Some(StaticMatch::Field(index));
        }
        name_match.get_or_insert(StaticMatch::Name(index));
    }
    name_match
}

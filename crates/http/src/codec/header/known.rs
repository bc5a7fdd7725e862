//! Registry of well known header names and values.
//!
//! Proxied headers are interned through this table: a name that matches a
//! registered header byte for byte is replaced by the shared `&'static str`,
//! and so is a value that matches one of the header's known values. Anything
//! else is copied.
//!
//! Lookup dispatches on the name length and then on one or two byte positions
//! chosen so that every registered name of that length lands on its own arm.
//! The dispatch bytes are ASCII lower-cased (`| 0x20`) which keeps the branch
//! small, but the final comparison is exact and case sensitive: `content-type`
//! is not interned as `Content-Type`.

use std::borrow::Cow;

#[derive(Debug, PartialEq, Eq)]
pub struct KnownHeader {
    name: &'static str,
    known_values: &'static [&'static str],
}

impl KnownHeader {
    const fn new(name: &'static str, known_values: &'static [&'static str]) -> Self {
        Self { name, known_values }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn name_bytes(&self) -> &'static [u8] {
        self.name.as_bytes()
    }

    pub fn known_values(&self) -> &'static [&'static str] {
        self.known_values
    }

    /// Returns the shared instance of `value` if it is one of this header's
    /// known values.
    #[inline]
    pub fn try_get_known_value(&self, value: &[u8]) -> Option<&'static str> {
        self.known_values.iter().copied().find(|known| known.as_bytes() == value)
    }

    /// Interns `value` when it is known, otherwise copies it as UTF-8.
    pub fn value(&self, value: &[u8]) -> Cow<'static, str> {
        match self.try_get_known_value(value) {
            Some(known) => Cow::Borrowed(known),
            None => Cow::Owned(String::from_utf8_lossy(value).into_owned()),
        }
    }
}

pub static PSEUDO_STATUS: KnownHeader = KnownHeader::new(":status", &[]);
pub static ACCEPT: KnownHeader = KnownHeader::new("Accept", &[]);
pub static ACCEPT_CHARSET: KnownHeader = KnownHeader::new("Accept-Charset", &[]);
pub static ACCEPT_ENCODING: KnownHeader = KnownHeader::new("Accept-Encoding", &[]);
pub static ACCEPT_LANGUAGE: KnownHeader = KnownHeader::new("Accept-Language", &[]);
pub static ACCEPT_PATCH: KnownHeader = KnownHeader::new("Accept-Patch", &[]);
pub static ACCEPT_RANGES: KnownHeader = KnownHeader::new("Accept-Ranges", &[]);
pub static ACCESS_CONTROL_ALLOW_CREDENTIALS: KnownHeader = KnownHeader::new("Access-Control-Allow-Credentials", &["true"]);
pub static ACCESS_CONTROL_ALLOW_HEADERS: KnownHeader = KnownHeader::new("Access-Control-Allow-Headers", &["*"]);
pub static ACCESS_CONTROL_ALLOW_METHODS: KnownHeader = KnownHeader::new("Access-Control-Allow-Methods", &["*"]);
pub static ACCESS_CONTROL_ALLOW_ORIGIN: KnownHeader = KnownHeader::new("Access-Control-Allow-Origin", &["*", "null"]);
pub static ACCESS_CONTROL_EXPOSE_HEADERS: KnownHeader = KnownHeader::new("Access-Control-Expose-Headers", &["*"]);
pub static ACCESS_CONTROL_MAX_AGE: KnownHeader = KnownHeader::new("Access-Control-Max-Age", &[]);
pub static AGE: KnownHeader = KnownHeader::new("Age", &[]);
pub static ALLOW: KnownHeader = KnownHeader::new("Allow", &[]);
pub static ALT_SVC: KnownHeader = KnownHeader::new("Alt-Svc", &[]);
pub static ALT_USED: KnownHeader = KnownHeader::new("Alt-Used", &[]);
pub static AUTHORIZATION: KnownHeader = KnownHeader::new("Authorization", &[]);
pub static CACHE_CONTROL: KnownHeader = KnownHeader::new("Cache-Control", &["must-revalidate", "no-cache", "no-store", "no-transform", "private", "proxy-revalidate", "public"]);
pub static CONNECTION: KnownHeader = KnownHeader::new("Connection", &["close"]);
pub static CONTENT_DISPOSITION: KnownHeader = KnownHeader::new("Content-Disposition", &["inline", "attachment"]);
pub static CONTENT_ENCODING: KnownHeader = KnownHeader::new("Content-Encoding", &["gzip", "deflate", "br", "compress", "identity"]);
pub static CONTENT_LANGUAGE: KnownHeader = KnownHeader::new("Content-Language", &[]);
pub static CONTENT_LENGTH: KnownHeader = KnownHeader::new("Content-Length", &[]);
pub static CONTENT_LOCATION: KnownHeader = KnownHeader::new("Content-Location", &[]);
pub static CONTENT_MD5: KnownHeader = KnownHeader::new("Content-MD5", &[]);
pub static CONTENT_RANGE: KnownHeader = KnownHeader::new("Content-Range", &[]);
pub static CONTENT_SECURITY_POLICY: KnownHeader = KnownHeader::new("Content-Security-Policy", &[]);
pub static CONTENT_TYPE: KnownHeader = KnownHeader::new("Content-Type", &[]);
pub static COOKIE: KnownHeader = KnownHeader::new("Cookie", &[]);
pub static COOKIE2: KnownHeader = KnownHeader::new("Cookie2", &[]);
pub static DATE: KnownHeader = KnownHeader::new("Date", &[]);
pub static ETAG: KnownHeader = KnownHeader::new("ETag", &[]);
pub static EXPECT: KnownHeader = KnownHeader::new("Expect", &["100-continue"]);
pub static EXPECT_CT: KnownHeader = KnownHeader::new("Expect-CT", &[]);
pub static EXPIRES: KnownHeader = KnownHeader::new("Expires", &[]);
pub static FROM: KnownHeader = KnownHeader::new("From", &[]);
pub static GRPC_ENCODING: KnownHeader = KnownHeader::new("grpc-encoding", &["identity", "gzip", "deflate"]);
pub static GRPC_MESSAGE: KnownHeader = KnownHeader::new("grpc-message", &[]);
pub static GRPC_STATUS: KnownHeader = KnownHeader::new("grpc-status", &["0"]);
pub static HOST: KnownHeader = KnownHeader::new("Host", &[]);
pub static IF_MATCH: KnownHeader = KnownHeader::new("If-Match", &[]);
pub static IF_MODIFIED_SINCE: KnownHeader = KnownHeader::new("If-Modified-Since", &[]);
pub static IF_NONE_MATCH: KnownHeader = KnownHeader::new("If-None-Match", &[]);
pub static IF_RANGE: KnownHeader = KnownHeader::new("If-Range", &[]);
pub static IF_UNMODIFIED_SINCE: KnownHeader = KnownHeader::new("If-Unmodified-Since", &[]);
pub static KEEP_ALIVE: KnownHeader = KnownHeader::new("Keep-Alive", &[]);
pub static LAST_MODIFIED: KnownHeader = KnownHeader::new("Last-Modified", &[]);
pub static LINK: KnownHeader = KnownHeader::new("Link", &[]);
pub static LOCATION: KnownHeader = KnownHeader::new("Location", &[]);
pub static MAX_FORWARDS: KnownHeader = KnownHeader::new("Max-Forwards", &[]);
pub static ORIGIN: KnownHeader = KnownHeader::new("Origin", &[]);
pub static P3P: KnownHeader = KnownHeader::new("P3P", &[]);
pub static PRAGMA: KnownHeader = KnownHeader::new("Pragma", &["no-cache"]);
pub static PROXY_AUTHENTICATE: KnownHeader = KnownHeader::new("Proxy-Authenticate", &[]);
pub static PROXY_AUTHORIZATION: KnownHeader = KnownHeader::new("Proxy-Authorization", &[]);
pub static PROXY_CONNECTION: KnownHeader = KnownHeader::new("Proxy-Connection", &[]);
pub static PROXY_SUPPORT: KnownHeader = KnownHeader::new("Proxy-Support", &[]);
pub static PUBLIC_KEY_PINS: KnownHeader = KnownHeader::new("Public-Key-Pins", &[]);
pub static RANGE: KnownHeader = KnownHeader::new("Range", &[]);
pub static REFERER: KnownHeader = KnownHeader::new("Referer", &[]);
pub static REFERRER_POLICY: KnownHeader = KnownHeader::new("Referrer-Policy", &["strict-origin-when-cross-origin", "origin-when-cross-origin", "strict-origin", "origin", "same-origin", "no-referrer-when-downgrade", "no-referrer", "unsafe-url"]);
pub static REFRESH: KnownHeader = KnownHeader::new("Refresh", &[]);
pub static RETRY_AFTER: KnownHeader = KnownHeader::new("Retry-After", &[]);
pub static SEC_WEBSOCKET_ACCEPT: KnownHeader = KnownHeader::new("Sec-WebSocket-Accept", &[]);
pub static SEC_WEBSOCKET_EXTENSIONS: KnownHeader = KnownHeader::new("Sec-WebSocket-Extensions", &[]);
pub static SEC_WEBSOCKET_KEY: KnownHeader = KnownHeader::new("Sec-WebSocket-Key", &[]);
pub static SEC_WEBSOCKET_PROTOCOL: KnownHeader = KnownHeader::new("Sec-WebSocket-Protocol", &[]);
pub static SEC_WEBSOCKET_VERSION: KnownHeader = KnownHeader::new("Sec-WebSocket-Version", &[]);
pub static SERVER: KnownHeader = KnownHeader::new("Server", &[]);
pub static SERVER_TIMING: KnownHeader = KnownHeader::new("Server-Timing", &[]);
pub static SET_COOKIE: KnownHeader = KnownHeader::new("Set-Cookie", &[]);
pub static SET_COOKIE2: KnownHeader = KnownHeader::new("Set-Cookie2", &[]);
pub static STRICT_TRANSPORT_SECURITY: KnownHeader = KnownHeader::new("Strict-Transport-Security", &[]);
pub static TE: KnownHeader = KnownHeader::new("TE", &["trailers", "compress", "deflate", "gzip"]);
pub static TSV: KnownHeader = KnownHeader::new("TSV", &[]);
pub static TRAILER: KnownHeader = KnownHeader::new("Trailer", &[]);
pub static TRANSFER_ENCODING: KnownHeader = KnownHeader::new("Transfer-Encoding", &["chunked", "compress", "deflate", "gzip", "identity"]);
pub static UPGRADE: KnownHeader = KnownHeader::new("Upgrade", &[]);
pub static UPGRADE_INSECURE_REQUESTS: KnownHeader = KnownHeader::new("Upgrade-Insecure-Requests", &["1"]);
pub static USER_AGENT: KnownHeader = KnownHeader::new("User-Agent", &[]);
pub static VARY: KnownHeader = KnownHeader::new("Vary", &["*"]);
pub static VIA: KnownHeader = KnownHeader::new("Via", &[]);
pub static WWW_AUTHENTICATE: KnownHeader = KnownHeader::new("WWW-Authenticate", &[]);
pub static WARNING: KnownHeader = KnownHeader::new("Warning", &[]);
pub static X_ASPNET_VERSION: KnownHeader = KnownHeader::new("X-AspNet-Version", &[]);
pub static X_CACHE: KnownHeader = KnownHeader::new("X-Cache", &[]);
pub static X_CONTENT_DURATION: KnownHeader = KnownHeader::new("X-Content-Duration", &[]);
pub static X_CONTENT_TYPE_OPTIONS: KnownHeader = KnownHeader::new("X-Content-Type-Options", &["nosniff"]);
pub static X_FRAME_OPTIONS: KnownHeader = KnownHeader::new("X-Frame-Options", &["DENY", "SAMEORIGIN"]);
pub static X_MSEDGE_REF: KnownHeader = KnownHeader::new("X-MSEdge-Ref", &[]);
pub static X_POWERED_BY: KnownHeader = KnownHeader::new("X-Powered-By", &[]);
pub static X_REQUEST_ID: KnownHeader = KnownHeader::new("X-Request-ID", &[]);
pub static X_UA_COMPATIBLE: KnownHeader = KnownHeader::new("X-UA-Compatible", &[]);
pub static X_XSS_PROTECTION: KnownHeader = KnownHeader::new("X-XSS-Protection", &["0", "1", "1; mode=block"]);

pub static ALL: [&KnownHeader; 95] = [
    &PSEUDO_STATUS,
    &ACCEPT,
    &ACCEPT_CHARSET,
    &ACCEPT_ENCODING,
    &ACCEPT_LANGUAGE,
    &ACCEPT_PATCH,
    &ACCEPT_RANGES,
    &ACCESS_CONTROL_ALLOW_CREDENTIALS,
    &ACCESS_CONTROL_ALLOW_HEADERS,
    &ACCESS_CONTROL_ALLOW_METHODS,
    &ACCESS_CONTROL_ALLOW_ORIGIN,
    &ACCESS_CONTROL_EXPOSE_HEADERS,
    &ACCESS_CONTROL_MAX_AGE,
    &AGE,
    &ALLOW,
    &ALT_SVC,
    &ALT_USED,
    &AUTHORIZATION,
    &CACHE_CONTROL,
    &CONNECTION,
    &CONTENT_DISPOSITION,
    &CONTENT_ENCODING,
    &CONTENT_LANGUAGE,
    &CONTENT_LENGTH,
    &CONTENT_LOCATION,
    &CONTENT_MD5,
    &CONTENT_RANGE,
    &CONTENT_SECURITY_POLICY,
    &CONTENT_TYPE,
    &COOKIE,
    &COOKIE2,
    &DATE,
    &ETAG,
    &EXPECT,
    &EXPECT_CT,
    &EXPIRES,
    &FROM,
    &GRPC_ENCODING,
    &GRPC_MESSAGE,
    &GRPC_STATUS,
    &HOST,
    &IF_MATCH,
    &IF_MODIFIED_SINCE,
    &IF_NONE_MATCH,
    &IF_RANGE,
    &IF_UNMODIFIED_SINCE,
    &KEEP_ALIVE,
    &LAST_MODIFIED,
    &LINK,
    &LOCATION,
    &MAX_FORWARDS,
    &ORIGIN,
    &P3P,
    &PRAGMA,
    &PROXY_AUTHENTICATE,
    &PROXY_AUTHORIZATION,
    &PROXY_CONNECTION,
    &PROXY_SUPPORT,
    &PUBLIC_KEY_PINS,
    &RANGE,
    &REFERER,
    &REFERRER_POLICY,
    &REFRESH,
    &RETRY_AFTER,
    &SEC_WEBSOCKET_ACCEPT,
    &SEC_WEBSOCKET_EXTENSIONS,
    &SEC_WEBSOCKET_KEY,
    &SEC_WEBSOCKET_PROTOCOL,
    &SEC_WEBSOCKET_VERSION,
    &SERVER,
    &SERVER_TIMING,
    &SET_COOKIE,
    &SET_COOKIE2,
    &STRICT_TRANSPORT_SECURITY,
    &TE,
    &TSV,
    &TRAILER,
    &TRANSFER_ENCODING,
    &UPGRADE,
    &UPGRADE_INSECURE_REQUESTS,
    &USER_AGENT,
    &VARY,
    &VIA,
    &WWW_AUTHENTICATE,
    &WARNING,
    &X_ASPNET_VERSION,
    &X_CACHE,
    &X_CONTENT_DURATION,
    &X_CONTENT_TYPE_OPTIONS,
    &X_FRAME_OPTIONS,
    &X_MSEDGE_REF,
    &X_POWERED_BY,
    &X_REQUEST_ID,
    &X_UA_COMPATIBLE,
    &X_XSS_PROTECTION,
];

/// Finds the registered header whose name is byte-equal to `name`.
pub fn lookup(name: &[u8]) -> Option<&'static KnownHeader> {
    let candidate = match name.len() {
        2 => Some(&TE),
        3 => match name[0] | 0x20 {
            b'a' => Some(&AGE),
            b'p' => Some(&P3P),
            b't' => Some(&TSV),
            b'v' => Some(&VIA),
            _ => None,
        },
        4 => match name[0] | 0x20 {
            b'd' => Some(&DATE),
            b'e' => Some(&ETAG),
            b'f' => Some(&FROM),
            b'h' => Some(&HOST),
            b'l' => Some(&LINK),
            b'v' => Some(&VARY),
            _ => None,
        },
        5 => match name[0] | 0x20 {
            b'a' => Some(&ALLOW),
            b'r' => Some(&RANGE),
            _ => None,
        },
        6 => match name[0] | 0x20 {
            b'a' => Some(&ACCEPT),
            b'c' => Some(&COOKIE),
            b'e' => Some(&EXPECT),
            b'o' => Some(&ORIGIN),
            b'p' => Some(&PRAGMA),
            b's' => Some(&SERVER),
            _ => None,
        },
        7 => match name[0] | 0x20 {
            b':' => Some(&PSEUDO_STATUS),
            b'a' => Some(&ALT_SVC),
            b'c' => Some(&COOKIE2),
            b'e' => Some(&EXPIRES),
            b'r' => match name[3] | 0x20 {
                b'e' => Some(&REFERER),
                b'r' => Some(&REFRESH),
                _ => None,
            },
            b't' => Some(&TRAILER),
            b'u' => Some(&UPGRADE),
            b'w' => Some(&WARNING),
            b'x' => Some(&X_CACHE),
            _ => None,
        },
        8 => match name[3] | 0x20 {
            b'-' => Some(&ALT_USED),
            b'a' => Some(&LOCATION),
            b'm' => Some(&IF_MATCH),
            b'r' => Some(&IF_RANGE),
            _ => None,
        },
        9 => Some(&EXPECT_CT),
        10 => match name[0] | 0x20 {
            b'c' => Some(&CONNECTION),
            b'k' => Some(&KEEP_ALIVE),
            b's' => Some(&SET_COOKIE),
            b'u' => Some(&USER_AGENT),
            _ => None,
        },
        11 => match name[0] | 0x20 {
            b'c' => Some(&CONTENT_MD5),
            b'g' => Some(&GRPC_STATUS),
            b'r' => Some(&RETRY_AFTER),
            b's' => Some(&SET_COOKIE2),
            _ => None,
        },
        12 => match name[5] | 0x20 {
            b'd' => Some(&X_MSEDGE_REF),
            b'e' => Some(&X_POWERED_BY),
            b'm' => Some(&GRPC_MESSAGE),
            b'n' => Some(&CONTENT_TYPE),
            b'o' => Some(&MAX_FORWARDS),
            b't' => Some(&ACCEPT_PATCH),
            b'u' => Some(&X_REQUEST_ID),
            _ => None,
        },
        13 => match name[2] | 0x20 {
            b'-' => Some(&IF_NONE_MATCH),
            b'c' => match name[0] | 0x20 {
                b'a' => Some(&ACCEPT_RANGES),
                b'c' => Some(&CACHE_CONTROL),
                _ => None,
            },
            b'n' => Some(&CONTENT_RANGE),
            b'o' => Some(&PROXY_SUPPORT),
            b'p' => Some(&GRPC_ENCODING),
            b'r' => Some(&SERVER_TIMING),
            b's' => Some(&LAST_MODIFIED),
            b't' => Some(&AUTHORIZATION),
            _ => None,
        },
        14 => match name[0] | 0x20 {
            b'a' => Some(&ACCEPT_CHARSET),
            b'c' => Some(&CONTENT_LENGTH),
            _ => None,
        },
        15 => match name[7] | 0x20 {
            b'-' => Some(&X_FRAME_OPTIONS),
            b'e' => Some(&ACCEPT_ENCODING),
            b'k' => Some(&PUBLIC_KEY_PINS),
            b'l' => Some(&ACCEPT_LANGUAGE),
            b'm' => Some(&X_UA_COMPATIBLE),
            b'r' => Some(&REFERRER_POLICY),
            _ => None,
        },
        16 => match name[11] | 0x20 {
            b'a' => Some(&CONTENT_LOCATION),
            b'c' => match name[0] | 0x20 {
                b'p' => Some(&PROXY_CONNECTION),
                b'x' => Some(&X_XSS_PROTECTION),
                _ => None,
            },
            b'g' => Some(&CONTENT_LANGUAGE),
            b'i' => Some(&WWW_AUTHENTICATE),
            b'o' => Some(&CONTENT_ENCODING),
            b'r' => Some(&X_ASPNET_VERSION),
            _ => None,
        },
        17 => match name[0] | 0x20 {
            b'i' => Some(&IF_MODIFIED_SINCE),
            b's' => Some(&SEC_WEBSOCKET_KEY),
            b't' => Some(&TRANSFER_ENCODING),
            _ => None,
        },
        18 => match name[0] | 0x20 {
            b'p' => Some(&PROXY_AUTHENTICATE),
            b'x' => Some(&X_CONTENT_DURATION),
            _ => None,
        },
        19 => match name[0] | 0x20 {
            b'c' => Some(&CONTENT_DISPOSITION),
            b'i' => Some(&IF_UNMODIFIED_SINCE),
            b'p' => Some(&PROXY_AUTHORIZATION),
            _ => None,
        },
        20 => Some(&SEC_WEBSOCKET_ACCEPT),
        21 => Some(&SEC_WEBSOCKET_VERSION),
        22 => match name[0] | 0x20 {
            b'a' => Some(&ACCESS_CONTROL_MAX_AGE),
            b's' => Some(&SEC_WEBSOCKET_PROTOCOL),
            b'x' => Some(&X_CONTENT_TYPE_OPTIONS),
            _ => None,
        },
        23 => Some(&CONTENT_SECURITY_POLICY),
        24 => Some(&SEC_WEBSOCKET_EXTENSIONS),
        25 => match name[0] | 0x20 {
            b's' => Some(&STRICT_TRANSPORT_SECURITY),
            b'u' => Some(&UPGRADE_INSECURE_REQUESTS),
            _ => None,
        },
        27 => Some(&ACCESS_CONTROL_ALLOW_ORIGIN),
        28 => match name[21] | 0x20 {
            b'h' => Some(&ACCESS_CONTROL_ALLOW_HEADERS),
            b'm' => Some(&ACCESS_CONTROL_ALLOW_METHODS),
            _ => None,
        },
        29 => Some(&ACCESS_CONTROL_EXPOSE_HEADERS),
        32 => Some(&ACCESS_CONTROL_ALLOW_CREDENTIALS),
        _ => None,
    };

    candidate.filter(|header| header.name.as_bytes() == name)
}

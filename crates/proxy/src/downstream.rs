//! Origin servers requests are forwarded to.

use std::str::FromStr;

use bytes::Bytes;
use http::Uri;
use http::uri::Scheme;

use crate::config::ConfigError;

const DEFAULT_HTTP_PORT: u16 = 80;

/// One configured origin: where to connect, what to send as `Host` and which
/// path every forwarded request target is prefixed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamTarget {
    uri: Uri,
    authority: Bytes,
    path_prefix: Bytes,
    no_path_prefix: bool,
    host: String,
    port: u16,
}

impl DownstreamTarget {
    /// Only absolute `http` URIs are accepted.
    pub fn from_uri(uri: Uri) -> Result<Self, ConfigError> {
        match uri.scheme() {
            Some(scheme) if *scheme == Scheme::HTTP => {}
            _ => return Err(ConfigError::unsupported_scheme(&uri)),
        }

        let authority = uri.authority().ok_or_else(|| ConfigError::missing_host(&uri))?;
        let host = authority.host();
        if host.is_empty() {
            return Err(ConfigError::missing_host(&uri));
        }

        let path = uri.path();
        Ok(Self {
            authority: Bytes::copy_from_slice(authority.as_str().as_bytes()),
            path_prefix: Bytes::copy_from_slice(path.as_bytes()),
            no_path_prefix: path.trim_start_matches('/').is_empty(),
            host: host.to_owned(),
            port: authority.port_u16().unwrap_or(DEFAULT_HTTP_PORT),
            uri,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// `host[:port]` exactly as configured, written as the `Host` header.
    pub fn authority(&self) -> &[u8] {
        &self.authority
    }

    pub fn path_prefix(&self) -> &[u8] {
        &self.path_prefix
    }

    pub fn no_path_prefix(&self) -> bool {
        self.no_path_prefix
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Writes the origin form target for a client `target` into `out`,
    /// replacing its previous content.
    ///
    /// The path prefix is prepended, a `/` on both sides of the junction is
    /// written once.
    pub fn resolve_target(&self, target: &[u8], out: &mut Vec<u8>) {
        out.clear();
        if self.no_path_prefix {
            out.extend_from_slice(target);
            return;
        }

        out.extend_from_slice(&self.path_prefix);
        let rest = match target.strip_prefix(b"/") {
            Some(rest) if self.path_prefix.ends_with(b"/") => rest,
            _ => target,
        };
        out.extend_from_slice(rest);
    }
}

impl FromStr for DownstreamTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri = s.parse::<Uri>().map_err(|e| ConfigError::invalid_uri(s, e))?;
        Self::from_uri(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(target: &DownstreamTarget, request_target: &str) -> String {
        let mut out = Vec::new();
        target.resolve_target(request_target.as_bytes(), &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_with_prefix() {
        let target: DownstreamTarget = "http://origin:9000/base/".parse().unwrap();
        assert_eq!(target.authority(), b"origin:9000");
        assert_eq!(target.path_prefix(), b"/base/");
        assert!(!target.no_path_prefix());
        assert_eq!(target.host(), "origin");
        assert_eq!(target.port(), 9000);

        assert_eq!(resolve(&target, "/foo?x=1"), "/base/foo?x=1");
        assert_eq!(resolve(&target, "/"), "/base/");
    }

    #[test]
    fn test_parse_without_prefix() {
        let target: DownstreamTarget = "http://origin".parse().unwrap();
        assert_eq!(target.authority(), b"origin");
        assert!(target.no_path_prefix());
        assert_eq!(target.port(), 80);

        assert_eq!(resolve(&target, "/foo?x=1"), "/foo?x=1");
    }

    #[test]
    fn test_prefix_without_trailing_slash() {
        let target: DownstreamTarget = "http://origin/api".parse().unwrap();
        assert_eq!(resolve(&target, "/users"), "/api/users");
    }

    #[test]
    fn test_rejected_uris() {
        assert!(matches!("https://origin/".parse::<DownstreamTarget>(), Err(ConfigError::UnsupportedScheme { .. })));
        assert!(matches!("origin:9000".parse::<DownstreamTarget>(), Err(ConfigError::UnsupportedScheme { .. })));
        assert!(matches!("/relative".parse::<DownstreamTarget>(), Err(ConfigError::UnsupportedScheme { .. })));
        assert!(matches!("http://bad host/".parse::<DownstreamTarget>(), Err(ConfigError::InvalidUri { .. })));
    }
}

//! Command line and environment configuration.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use micro_proxy_http::connection::DEFAULT_ERROR_LOG_LIMIT;
use thiserror::Error;
use tracing::Level;

use crate::downstream::DownstreamTarget;
use crate::selector::AddressSelector;

const DEFAULT_MAX_REQUEST_BODY: u64 = 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "micro-proxy", version)]
#[command(about = "A minimal-overhead HTTP/1.1 reverse proxy", long_about = None)]
pub struct ProxyConfig {
    /// Address to accept client connections on
    #[arg(long, env = "MICRO_PROXY_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Semicolon separated list of origin URIs, e.g. `http://10.0.0.1:9000/api/;http://10.0.0.2:9000/api/`
    #[arg(long, env = "MICRO_PROXY_DOWNSTREAM", default_value = "http://127.0.0.1:9000/")]
    pub downstream: String,

    /// How each client connection picks its origin
    #[arg(long, env = "MICRO_PROXY_SELECTION", value_enum, default_value_t = Selection::RoundRobin)]
    pub selection: Selection,

    /// Add a `Date` header to responses whose origin did not send one
    #[arg(long, env = "MICRO_PROXY_DATE_HEADER")]
    pub date_header: bool,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MICRO_PROXY_MAX_REQUEST_BODY", default_value_t = DEFAULT_MAX_REQUEST_BODY)]
    pub max_request_body: u64,

    /// Number of connection errors logged at error level before falling back to debug
    #[arg(long, env = "MICRO_PROXY_ERROR_LOG_LIMIT", default_value_t = DEFAULT_ERROR_LOG_LIMIT)]
    pub error_log_limit: usize,

    #[arg(long, env = "MICRO_PROXY_LOG_LEVEL", default_value = "info")]
    pub log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Selection {
    /// Every new connection takes the next origin in turn
    RoundRobin,
    /// Every connection goes to the first origin
    Fixed,
}

impl ProxyConfig {
    pub fn downstream_targets(&self) -> Result<Vec<DownstreamTarget>, ConfigError> {
        let targets = self
            .downstream
            .split(';')
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<DownstreamTarget>, _>>()?;

        if targets.is_empty() {
            return Err(ConfigError::NoDownstream);
        }
        Ok(targets)
    }

    pub fn address_selector(&self) -> Result<AddressSelector, ConfigError> {
        let targets = self.downstream_targets()?;
        match self.selection {
            Selection::RoundRobin => AddressSelector::round_robin(targets),
            Selection::Fixed => {
                let target = targets.into_iter().next().ok_or(ConfigError::NoDownstream)?;
                Ok(AddressSelector::fixed(target))
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid downstream uri {value:?}: {source}")]
    InvalidUri {
        value: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("downstream uri {value:?} is not an absolute http uri")]
    UnsupportedScheme { value: String },

    #[error("downstream uri {value:?} has no host")]
    MissingHost { value: String },

    #[error("no downstream configured")]
    NoDownstream,
}

impl ConfigError {
    pub fn invalid_uri(value: &str, source: http::uri::InvalidUri) -> Self {
        Self::InvalidUri { value: value.to_owned(), source }
    }

    pub fn unsupported_scheme<S: ToString>(value: &S) -> Self {
        Self::UnsupportedScheme { value: value.to_string() }
    }

    pub fn missing_host<S: ToString>(value: &S) -> Self {
        Self::MissingHost { value: value.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ProxyConfig {
        let mut argv = vec!["micro-proxy"];
        argv.extend_from_slice(args);
        ProxyConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.selection, Selection::RoundRobin);
        assert!(!config.date_header);
        assert_eq!(config.max_request_body, 1024 * 1024);
        assert_eq!(config.error_log_limit, 10);
        assert_eq!(config.log_level, Level::INFO);

        let targets = config.downstream_targets().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].authority(), b"127.0.0.1:9000");
    }

    #[test]
    fn test_downstream_list() {
        let config = parse(&["--downstream", "http://a:1/x/; http://b:2/ ;", "--selection", "fixed", "--date-header"]);
        let targets = config.downstream_targets().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].host(), "b");
        assert!(config.date_header);

        let selector = config.address_selector().unwrap();
        assert_eq!(selector.next().host(), "a");
        assert_eq!(selector.next().host(), "a");
    }

    #[test]
    fn test_bad_downstream() {
        let config = parse(&["--downstream", "http://a/;https://b/"]);
        assert!(matches!(config.downstream_targets(), Err(ConfigError::UnsupportedScheme { .. })));

        let config = parse(&["--downstream", " ; "]);
        assert!(matches!(config.downstream_targets(), Err(ConfigError::NoDownstream)));
    }

    #[test]
    fn test_unknown_selection_rejected() {
        assert!(ProxyConfig::try_parse_from(["micro-proxy", "--selection", "random"]).is_err());
    }
}

//! micro-proxy: a minimal-overhead HTTP/1.1 reverse proxy.
//!
//! Each accepted client connection is bound to one origin, chosen by an
//! [`selector::AddressSelector`]. Requests are parsed by the
//! `micro-proxy-http` pipeline, rewritten by [`handler::ProxyHandler`] and
//! sent over a single persistent origin connection. Responses stream back
//! without being buffered in full.
//!
//! # Example
//!
//! ```no_run
//! use micro_proxy::server::ProxyServer;
//! use micro_proxy::selector::AddressSelector;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let selector = AddressSelector::round_robin(vec![
//!         "http://127.0.0.1:9001/".parse()?,
//!         "http://127.0.0.1:9002/".parse()?,
//!     ])?;
//!
//!     ProxyServer::builder()
//!         .address("127.0.0.1:8080".parse()?)
//!         .selector(selector)
//!         .build()?
//!         .start()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod downstream;
pub mod handler;
pub mod origin;
pub mod selector;
pub mod server;

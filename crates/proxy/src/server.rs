use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use micro_proxy_http::connection::{ConnectionContext, ErrorLogLimiter, HttpConnection};
use micro_proxy_http::date::DateService;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, trace, warn};

use crate::config::{ConfigError, ProxyConfig};
use crate::handler::ProxyHandler;
use crate::origin::Http1OriginClient;
use crate::selector::AddressSelector;

pub struct ProxyServerBuilder {
    address: Option<SocketAddr>,
    selector: Option<AddressSelector>,
    context: ConnectionContext,
}

impl ProxyServerBuilder {
    fn new() -> Self {
        Self { address: None, selector: None, context: ConnectionContext::default() }
    }

    pub fn address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    pub fn selector(mut self, selector: AddressSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn context(mut self, context: ConnectionContext) -> Self {
        self.context = context;
        self
    }

    pub fn build(self) -> Result<ProxyServer, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?;
        let selector = self.selector.ok_or(ServerBuildError::MissingSelector)?;
        Ok(ProxyServer { address, selector: Arc::new(selector), context: self.context })
    }
}

impl std::fmt::Debug for ProxyServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyServerBuilder").field("address", &self.address).finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,
    #[error("address selector must be set")]
    MissingSelector,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Accepts client connections and proxies each to the origin its
/// [`AddressSelector`] picks.
#[derive(Debug)]
pub struct ProxyServer {
    address: SocketAddr,
    selector: Arc<AddressSelector>,
    context: ConnectionContext,
}

impl ProxyServer {
    pub fn builder() -> ProxyServerBuilder {
        ProxyServerBuilder::new()
    }

    /// Builds the server described by `config`.
    ///
    /// Must run inside a tokio runtime when the `Date` header is enabled.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerBuildError> {
        let mut context = ConnectionContext::new(Arc::new(ErrorLogLimiter::new(config.error_log_limit)))
            .with_max_request_body(config.max_request_body);
        if config.date_header {
            context = context.with_date_service(Arc::new(DateService::new()));
        }

        Self::builder().address(config.listen).selector(config.address_selector()?).context(context).build()
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Binds the configured address and serves until the process ends.
    pub async fn start(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.address).await?;
        self.serve(listener).await;
        Ok(())
    }

    /// Serves connections accepted by `listener`.
    pub async fn serve(self, listener: TcpListener) {
        info!(address = ?listener.local_addr().ok(), downstreams = self.selector.len(), "start listening");

        loop {
            let (tcp_stream, remote_addr) = match listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let selector = Arc::clone(&self.selector);
            let context = self.context.clone();
            tokio::spawn(async move {
                trace!(%remote_addr, "accepted connection");
                serve_connection(tcp_stream, &selector, context).await;
            });
        }
    }
}

async fn serve_connection(tcp_stream: TcpStream, selector: &AddressSelector, context: ConnectionContext) {
    if let Err(e) = tcp_stream.set_nodelay(true) {
        debug!(cause = %e, "set nodelay failed");
    }

    let target = selector.next();
    let client = match Http1OriginClient::connect(triomphe::Arc::clone(&target)).await {
        Ok(client) => client,
        Err(e) => {
            if context.error_log().try_acquire() {
                error!(cause = %e, "origin unavailable, closing client connection");
            } else {
                debug!(cause = %e, "origin unavailable, closing client connection");
            }
            return;
        }
    };

    let (reader, writer) = tcp_stream.into_split();
    let handler = ProxyHandler::new(target, client);
    if HttpConnection::new(reader, writer, handler, context).process().await.is_ok() {
        trace!("finished process, connection shutdown");
    }
}

use std::process::ExitCode;

use clap::Parser;
use micro_proxy::config::ProxyConfig;
use micro_proxy::server::ProxyServer;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ProxyConfig::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(config.log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    let server = match ProxyServer::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match server.start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, address = %config.listen, "failed to listen");
            ExitCode::FAILURE
        }
    }
}

// JSON database server
// Serves get/set/delete/exit requests until an exit request or Ctrl-C

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jsondb::config::{ServerArgs, ServerConfig};
use jsondb::Server;

#[tokio::main]
async fn main() -> ExitCode {
    let config: ServerConfig = ServerArgs::parse().into();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: ServerConfig) -> jsondb::Result<()> {
    let server = Server::bind(&config).await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.trigger();
        }
    });

    server.run().await
}

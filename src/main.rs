use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use tinyftpd::config::Config;
use tinyftpd::core_cli::Cli;
use tinyftpd::core_log::logger::init_logger;
use tinyftpd::Server;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();
    init_logger(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };
    args.apply(&mut config);
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads)
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async move {
        let server = Server::bind(config)?;
        let shutdown = server.shutdown_handle();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("SIGINT received, shutting down");
                    shutdown.trigger();
                }
                Err(e) => error!("Failed to listen for SIGINT: {}", e),
            }
        });

        server.run().await
    })
}

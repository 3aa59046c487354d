//! ragguard CLI entry point.

use clap::Parser;

use ragguard::cli::{handle_error, run, Cli};
use ragguard::infrastructure::logging::LoggerImpl;
use ragguard::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: invalid configuration: {err:#}");
            std::process::exit(2);
        }
    };

    let logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Error: failed to initialize logging: {err:#}");
            std::process::exit(2);
        }
    };

    let result = run(cli, config).await;
    // Flush file logs before exiting.
    drop(logger);

    if let Err(err) = result {
        std::process::exit(handle_error(&err, json));
    }
}

//! atc CLI entry point.

use clap::Parser;

use atc::cli::{handle_error, AppContext, Cli};
use atc::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let ctx = match AppContext::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => handle_error(err, cli.json),
    };

    let mut log_config = LogConfig::from(&ctx.config.logging);
    // Keep stdout clean for command output; only the daemon logs to stdout.
    log_config.enable_stdout = matches!(cli.command, atc::cli::Commands::Serve(_));
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    if let Err(err) = atc::cli::run(cli.command, &ctx, cli.json).await {
        handle_error(err, cli.json);
    }
}

use bciremote::cli::Cli;
use bciremote::logger::{initialize as LoggerInitialize, prepare_log_dir};
use bciremote::session;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_dir = match prepare_log_dir(cli.log_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = LoggerInitialize(&log_dir, cli.level()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    info!("bciremote starting");
    info!("Log directory: {}", log_dir.display());

    match session::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

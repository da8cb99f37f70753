// src/main.rs

use std::process::ExitCode;

use watchcmd::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit inside clap with status 2.
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("watchcmd error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("watchcmd error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

//! cogbot binary entry point.

use std::process::ExitCode;

use cogbot::api::serve;
use cogbot::cli::{self, Args};
use cogbot::config::Config;
use cogbot::logging;
use cogbot::security::generate_relay_key;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'cogbot --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }
    if args.generate_key {
        println!("{}", generate_relay_key());
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args)?;
    if logging::init_with_filter(config.log_filter()).is_err() {
        eprintln!("warning: logging was already initialized");
    }

    info!("cogbot v{}", env!("CARGO_PKG_VERSION"));

    let state = config.build_state()?;
    if state.auth.is_enabled() {
        info!(keys = state.auth.count(), "Relay authentication enabled");
    } else {
        warn!("Relay authentication disabled; bind to a trusted interface only");
    }
    info!(
        dir = %config.storage.data_dir.display(),
        "Guild settings directory ready"
    );

    serve(config.to_server_config()?, state).await?;
    Ok(())
}

extern crate clap;

mod animation;
mod config;
mod errors;
mod gauge;
mod history;
mod locator;
mod orchestrator;
mod results;
mod signal;
mod stages;
mod tui;

use crate::config::{Cli, SimulationConfig};
use crate::errors::{exit_codes, format_error_for_display, DialError, ErrorKind};
use crate::locator::{HttpLocator, OfflineLocator};
use crate::results::RunSummary;
use crate::signal::{RandomSource, RngSource};
use crate::tui::TuiController;
use clap::Parser;
use env_logger::Target;
use log::{info, LevelFilter};
use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    let cli: Cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(error) => {
            eprintln!("{}", format_error_for_display(&error));
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), DialError> {
    init_logging(&cli)?;
    info!(
        "fastdial {} ({})",
        VERSION,
        option_env!("FASTDIAL_BUILD_GIT_HASH").unwrap_or("unknown revision")
    );

    let config = SimulationConfig::from(&cli);
    let random: Box<dyn RandomSource> = match cli.seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    };

    let mut controller = TuiController::new();
    controller.init()?;

    let outcome = if cli.offline {
        controller.run(Arc::new(OfflineLocator), config, random).await
    } else {
        controller.run(Arc::new(HttpLocator::new()), config, random).await
    };

    controller.cleanup()?;
    let state = outcome?;

    let Some(results) = RunSummary::from_state(&state) else {
        info!("Last run ended during {}, no summary", state.phase);
        return Ok(());
    };

    if cli.json {
        let json = results.to_json().map_err(|e| {
            DialError::new(ErrorKind::Unknown, e.to_string()).with_source(e)
        })?;
        println!("{}", json);
    } else {
        println!("{}", results.to_text());
    }

    Ok(())
}

/// The TUI owns the terminal, so logs go to `--log-file` when given and
/// only errors are kept otherwise.
fn init_logging(cli: &Cli) -> Result<(), DialError> {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_millis();

    match cli.log_file {
        Some(ref path) => {
            let file = File::create(path).map_err(|e| {
                DialError::config(format!(
                    "cannot open log file {}: {}",
                    path.display(),
                    e
                ))
                .with_suggestion("Pass a writable file path to --log-file.")
                .with_source(e)
            })?;

            builder
                .filter_level(cli.verbose.log_level_filter())
                .target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(LevelFilter::Error);
        }
    }

    builder.init();
    Ok(())
}

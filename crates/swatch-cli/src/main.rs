//! swatch CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};

use swatch_cli::{
    Args,
    error_adapter::{Reportable, diagnostic_reportables, to_reportables},
};

fn render(reportables: &[Reportable<'_>]) -> Vec<String> {
    let reporter = miette::GraphicalReportHandler::new();
    reportables
        .iter()
        .map(|reportable| {
            let mut writer = String::new();
            reporter
                .render_report(&mut writer, reportable)
                .expect("Writing to String buffer is infallible");
            writer
        })
        .collect()
}

#[tokio::main]
async fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting swatch");
    debug!(args:?; "Parsed arguments");

    match swatch_cli::run(&args).await {
        Ok(outcome) => {
            for report in render(&diagnostic_reportables(&outcome.diagnostics)) {
                warn!("{report}");
            }
            info!(tokens = outcome.tokens; "Completed successfully");
        }
        Err(err) => {
            // Render each diagnostic independently
            for report in render(&to_reportables(&err)) {
                error!("{report}");
            }
            process::exit(1);
        }
    }
}

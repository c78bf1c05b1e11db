use std::process::ExitCode;

use clap::Parser;
use colored::*;
use sved::config::Cli;
use sved::{app, logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_options());

    tracing::debug!(
        "got following arguments {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let code = match app::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{} {:#}", "error:".red().bold(), e);
            1
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wandelwerk — document and media transformation from the command line.
//
// Entry point. Initialises logging, loads configuration, and hands the parsed
// command to the engine.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use wandelwerk_core::human_errors::humanize_error;

use cli::Cli;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let human = humanize_error(&e);
            eprintln!("error: {}", human.message);
            eprintln!("hint: {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

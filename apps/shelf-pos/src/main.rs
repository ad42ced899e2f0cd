//! # Shelf POS Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        shelf-pos binary                                 │
//! │                                                                         │
//! │  main.rs ────► parses args (clap), reports errors, sets the exit code  │
//! │  lib.rs  ────► logging, config, database, command dispatch             │
//! │                                                                         │
//! │  stdout: JSON or receipt text         stderr: logs and errors          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;
use shelf_pos::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match shelf_pos::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

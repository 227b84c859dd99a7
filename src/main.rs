mod cli;
mod config;
mod console;
mod history;
mod identity;
mod interpret;
mod logbook;
mod model;
mod session;
mod target;

use std::{io, process};

use tracing_subscriber::EnvFilter;

use config::Config;

fn main() {
    let filter = EnvFilter::try_from_env("VOXELURN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

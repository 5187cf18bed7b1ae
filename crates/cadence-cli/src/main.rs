//! Cadence CLI Application
//!
//! Offline command-line front end for the Cadence synchronization core.

mod args;
mod cli;
mod renderer;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let cli = Cli::new(TerminalRenderer::new(!no_color), database_file);

    info!("Cadence started");

    match command {
        Diff(args) => cli.diff(&args),
        Events(args) => cli.events(&args),
        Show(args) => cli.show(&args),
        Outbox { command } => cli.handle_outbox_command(command).await,
        Order(args) => cli.order(&args),
    }
}

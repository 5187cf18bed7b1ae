use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{DiffArgs, EventsArgs, OrderArgs, OutboxCommands, ShowArgs};

/// Offline tools for Cadence workout plans
///
/// Cadence tracks edits to a plan tree (plan, phases, sessions, exercises)
/// and turns them into ordered mutation events. This tool diffs plan files,
/// previews the events a diff produces, inspects the durable outbox and sorts
/// order markers.
#[derive(Parser)]
#[command(version, about, name = "cadence")]
pub struct Args {
    /// Path to the outbox database. Defaults to
    /// $XDG_DATA_HOME/cadence/outbox.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the changes between two plan files
    #[command(alias = "d")]
    Diff(DiffArgs),
    /// Preview the mutation events two plan files differ by
    #[command(alias = "e")]
    Events(EventsArgs),
    /// Print a plan file as a tree
    Show(ShowArgs),
    /// Inspect or clear the durable outbox
    #[command(alias = "o")]
    Outbox {
        #[command(subcommand)]
        command: OutboxCommands,
    },
    /// Sort order markers naturally (A2 before A10)
    Order(OrderArgs),
}

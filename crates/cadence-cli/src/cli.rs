//! Command arguments and their handlers.
//!
//! Argument structs carry the clap derives; the core types stay free of
//! them. [`Cli`] runs each command and hands markdown to the
//! [`TerminalRenderer`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use cadence_core::{
    editor::default_outbox_path, events_from_changes, ChangeReport, ChangeTracker, ClearResult,
    Events, OrderMarker, Outbox, OutboxEntries, OutboxStatus, Plan, TrackerOptions,
};
use clap::{Args, Subcommand, ValueEnum};
use log::debug;

use crate::renderer::TerminalRenderer;

/// Two plan files to compare
#[derive(Args)]
pub struct PlanPair {
    #[arg(help = "Plan file (JSON) holding the previous state")]
    pub before: PathBuf,
    #[arg(help = "Plan file (JSON) holding the current state")]
    pub after: PathBuf,
    /// Do not count expanded/collapsed flags as changes
    #[arg(long)]
    pub ignore_ui_fields: bool,
}

impl PlanPair {
    fn options(&self) -> TrackerOptions {
        TrackerOptions {
            track_ui_fields: !self.ignore_ui_fields,
        }
    }

    /// Loads both files and diffs them into a tracker.
    fn track(&self) -> Result<(Plan, ChangeTracker)> {
        let before = load_plan(&self.before)?;
        let after = load_plan(&self.after)?;
        if before.id != after.id {
            bail!(
                "Plan files describe different plans: {} and {}",
                before.id,
                after.id
            );
        }

        let mut tracker = ChangeTracker::with_options(&before.phases, self.options());
        tracker.update_current_state(&after.phases);
        Ok((after, tracker))
    }
}

/// Show the changes between two plan files
///
/// Entities are matched by id across the whole tree. Parent ids and the
/// numeric order of phases and sessions are not compared, so moving an
/// entity to another parent or reordering phases and sessions is not
/// reported. Exercise order markers are compared.
#[derive(Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub plans: PlanPair,
    /// Print the change set as JSON
    #[arg(long)]
    pub json: bool,
}

/// Preview the mutation events for the changes between two plan files
///
/// Events are listed in delivery order: creates parent-first, then updates,
/// then deletes child-first. Sequence numbers are illustrative; the queue
/// assigns real ones on submission.
#[derive(Args)]
pub struct EventsArgs {
    #[command(flatten)]
    pub plans: PlanPair,
    #[arg(long, help = "User recorded as the author of every event")]
    pub actor: String,
    /// Print the events as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(help = "Plan file (JSON) to print")]
    pub plan: PathBuf,
}

#[derive(Args)]
pub struct OrderArgs {
    #[arg(required = true, help = "Order markers to sort, e.g. A10 A2 B1")]
    pub markers: Vec<String>,
}

#[derive(Args)]
pub struct OutboxFilterArgs {
    #[arg(short, long, help = "Only entries with this status")]
    pub status: Option<OutboxStatusArg>,
}

#[derive(Subcommand)]
pub enum OutboxCommands {
    /// List persisted events in sequence order
    #[command(alias = "l")]
    List(OutboxFilterArgs),
    /// Delete persisted events
    Clear(OutboxFilterArgs),
}

/// Command-line representation of outbox entry states
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutboxStatusArg {
    /// Written but not answered yet
    Pending,
    /// Rejected or never delivered
    Failed,
}

impl From<OutboxStatusArg> for OutboxStatus {
    fn from(val: OutboxStatusArg) -> Self {
        match val {
            OutboxStatusArg::Pending => OutboxStatus::Pending,
            OutboxStatusArg::Failed => OutboxStatus::Failed,
        }
    }
}

/// Runs commands and renders their output.
pub struct Cli {
    renderer: TerminalRenderer,
    database_file: Option<PathBuf>,
}

impl Cli {
    pub fn new(renderer: TerminalRenderer, database_file: Option<PathBuf>) -> Self {
        Self {
            renderer,
            database_file,
        }
    }

    pub fn diff(&self, args: &DiffArgs) -> Result<()> {
        let (plan, tracker) = args.plans.track()?;
        let changes = tracker.changes();

        if args.json {
            let json = serde_json::to_string_pretty(changes)
                .context("Failed to serialize change set")?;
            println!("{json}");
            return Ok(());
        }

        let markdown = format!("# Changes to {}\n\n{}", plan.name, ChangeReport(changes));
        self.renderer.render(&markdown)
    }

    pub fn events(&self, args: &EventsArgs) -> Result<()> {
        let (plan, tracker) = args.plans.track()?;
        let mut events = events_from_changes(&plan.id, &args.actor, &tracker);
        for (sequence, event) in (1..).zip(events.iter_mut()) {
            event.sequence = sequence;
        }
        debug!("Previewing {} events for plan {}", events.len(), plan.id);

        if args.json {
            let json =
                serde_json::to_string_pretty(&events).context("Failed to serialize events")?;
            println!("{json}");
            return Ok(());
        }

        let markdown = format!("# Events for {}\n\n{}", plan.id, Events(events));
        self.renderer.render(&markdown)
    }

    pub fn show(&self, args: &ShowArgs) -> Result<()> {
        let plan = load_plan(&args.plan)?;
        self.renderer.render(&plan.to_string())
    }

    pub fn order(&self, args: &OrderArgs) -> Result<()> {
        let mut markers: Vec<OrderMarker> =
            args.markers.iter().map(|m| OrderMarker::new(m.as_str())).collect();
        markers.sort();
        for marker in markers {
            println!("{marker}");
        }
        Ok(())
    }

    pub async fn handle_outbox_command(&self, command: OutboxCommands) -> Result<()> {
        let outbox = self.open_outbox().await?;
        match command {
            OutboxCommands::List(args) => {
                let entries = outbox
                    .entries(args.status.map(Into::into))
                    .await
                    .context("Failed to list outbox entries")?;
                let markdown = format!("# Outbox\n\n{}", OutboxEntries(entries));
                self.renderer.render(&markdown)
            }
            OutboxCommands::Clear(args) => {
                let status = args.status.map(OutboxStatus::from);
                let removed = outbox
                    .clear(status)
                    .await
                    .context("Failed to clear outbox")?;
                self.renderer
                    .render(&ClearResult { removed, status }.to_string())
            }
        }
    }

    async fn open_outbox(&self) -> Result<Outbox> {
        let path = match &self.database_file {
            Some(path) => path.clone(),
            None => default_outbox_path().context("Failed to locate the default outbox")?,
        };
        Outbox::open(&path)
            .await
            .with_context(|| format!("Failed to open outbox at {}", path.display()))
    }
}

fn load_plan(path: &Path) -> Result<Plan> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    let plan: Plan = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse plan file {}", path.display()))?;

    if let Some(link) = plan.validate_links().first() {
        bail!("Plan file {} has a dangling parent: {link}", path.display());
    }
    Ok(plan)
}

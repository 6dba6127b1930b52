//! Command-line interface for tracker
//!
//! This module defines the CLI structure using clap derive macros.
//! Each entity kind has its own submodule; data commands load the CSV
//! data file, apply one operation and save it back.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::service::Tracker;
use crate::storage;
use crate::task::{minutes, Entity, Status};

mod epic;
mod serve;
mod subtask;
mod task;

pub use epic::EpicCommands;
pub use subtask::SubtaskCommands;
pub use task::TaskCommands;

/// Data file used when neither `--file` nor `storage.path` is set
pub const DEFAULT_DATA_FILE: &str = "tasks.csv";

/// tracker - task, epic and subtask tracker
///
/// Keeps tasks in a CSV file, rejects overlapping schedules and serves
/// the same store over HTTP.
#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to tracker.toml (defaults to ./tracker.toml when present)
    #[arg(long, global = true, env = "TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// CSV data file (overrides storage.path)
    #[arg(long, global = true, env = "TRACKER_FILE")]
    pub file: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the store over HTTP
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Plain tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Epics and their subtasks
    #[command(subcommand)]
    Epic(EpicCommands),

    /// Subtasks
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// List scheduled tasks and subtasks by start time
    Prioritized,
}

/// Schedule flags shared by tasks and subtasks
#[derive(Args, Debug, Default)]
pub struct ScheduleArgs {
    /// Start time, e.g. 2025-03-01T09:00
    #[arg(long)]
    pub start: Option<String>,

    /// Duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub duration: Option<i64>,
}

impl ScheduleArgs {
    pub fn start_time(&self) -> Result<Option<NaiveDateTime>> {
        self.start.as_deref().map(parse_start).transpose()
    }

    pub fn duration(&self) -> Result<Option<Duration>> {
        self.duration
            .map(|raw| {
                minutes::from_minutes(raw).ok_or_else(|| {
                    Error::InvalidArgument(format!("duration of {raw} minutes is out of range"))
                })
            })
            .transpose()
    }
}

fn parse_start(raw: &str) -> Result<NaiveDateTime> {
    storage::parse_date_time(raw.trim()).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "invalid start time '{raw}' (expected YYYY-MM-DDTHH:MM[:SS])"
        ))
    })
}

pub(crate) fn parse_status(raw: &str) -> Result<Status> {
    raw.parse()
}

/// Resolved global options handed to every command
#[derive(Debug)]
pub(crate) struct Context {
    pub config: Config,
    pub file: Option<PathBuf>,
    pub output: OutputOptions,
}

impl Context {
    /// `--file`, then `storage.path`, then `tasks.csv`
    pub fn data_file(&self) -> PathBuf {
        self.file
            .clone()
            .or_else(|| self.config.storage.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }

    pub fn open(&self) -> Result<Tracker> {
        let file = self.config.storage.task_file(self.data_file());
        tracing::debug!(path = %file.path().display(), "opening data file");
        Tracker::open(file, self.config.history.tracker())
    }

    pub fn emit<T: serde::Serialize>(
        &self,
        command: &str,
        data: &T,
        human: &HumanOutput,
    ) -> Result<()> {
        emit_success(self.output, command, data, Some(human))
    }
}

/// One-line rendering of any record
pub(crate) fn describe(entity: &Entity) -> String {
    let mut line = format!(
        "#{} {} [{}] {}",
        entity.id(),
        entity.kind(),
        entity.status(),
        entity.name()
    );
    if let Some(epic_id) = entity.epic_id() {
        line.push_str(&format!(" (epic #{epic_id})"));
    }
    if let Some(start) = entity.start_time() {
        line.push_str(&format!(" @ {}", start.format("%Y-%m-%dT%H:%M")));
    }
    if let Some(duration) = entity.duration() {
        line.push_str(&format!(" for {} min", duration.num_minutes()));
    }
    line
}

/// Summary block for a single record
pub(crate) fn describe_one(header: String, entity: &Entity) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("id", entity.id().to_string());
    human.push_summary("name", entity.name());
    if !entity.description().is_empty() {
        human.push_summary("description", entity.description());
    }
    human.push_summary("status", entity.status().as_str());
    if let Some(epic_id) = entity.epic_id() {
        human.push_summary("epic", epic_id.to_string());
    }
    if let Some(start) = entity.start_time() {
        human.push_summary("start", start.format("%Y-%m-%dT%H:%M").to_string());
    }
    if let Some(duration) = entity.duration() {
        human.push_summary("duration", format!("{} min", duration.num_minutes()));
    }
    if let Some(end) = entity.end_time() {
        human.push_summary("end", end.format("%Y-%m-%dT%H:%M").to_string());
    }
    human
}

/// Listing block: a count header plus one detail line per record
pub(crate) fn describe_many<'a>(
    noun: &str,
    entities: impl IntoIterator<Item = &'a Entity>,
) -> HumanOutput {
    let lines: Vec<String> = entities.into_iter().map(describe).collect();
    let mut human = HumanOutput::new(format!("{noun}: {}", lines.len()));
    for line in lines {
        human.push_detail(line);
    }
    human
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(Path::new("."))?,
        };
        let ctx = Context {
            config,
            file: self.file,
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        };

        match self.command {
            Commands::Serve { host, port } => serve::run(&ctx, host, port),
            Commands::Task(cmd) => task::run(&ctx, cmd),
            Commands::Epic(cmd) => epic::run(&ctx, cmd),
            Commands::Subtask(cmd) => subtask::run(&ctx, cmd),
            Commands::Prioritized => run_prioritized(&ctx),
        }
    }
}

fn run_prioritized(ctx: &Context) -> Result<()> {
    let tracker = ctx.open()?;
    let entities = tracker.get_prioritized_tasks();
    let human = describe_many("prioritized", &entities);
    ctx.emit("prioritized", &entities, &human)
}

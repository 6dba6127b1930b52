//! tracker subtask command implementation

use clap::Subcommand;

use super::task::removal;
use super::{describe_many, describe_one, parse_status, Context, ScheduleArgs};
use crate::error::Result;
use crate::output::HumanOutput;
use crate::task::{Entity, Subtask, TaskId};

/// Subtask subcommands
#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Create a subtask under an epic
    Add {
        /// Owning epic ID
        #[arg(long)]
        epic: TaskId,

        /// Subtask name
        name: String,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Status: new, in-progress, done
        #[arg(long, default_value = "new")]
        status: String,

        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// List all subtasks
    List,

    /// Show one subtask
    Show {
        /// Subtask ID
        id: TaskId,
    },

    /// Change fields of an existing subtask
    Update {
        /// Subtask ID
        id: TaskId,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Drop the start time and duration
        #[arg(long, conflicts_with_all = ["start", "duration"])]
        unschedule: bool,
    },

    /// Delete a subtask
    Rm {
        /// Subtask ID
        id: TaskId,
    },

    /// Delete every subtask
    Clear,
}

pub(crate) fn run(ctx: &Context, cmd: SubtaskCommands) -> Result<()> {
    match cmd {
        SubtaskCommands::Add {
            epic,
            name,
            description,
            status,
            schedule,
        } => {
            let mut subtask = Subtask::new(epic, name, description, parse_status(&status)?);
            subtask.start_time = schedule.start_time()?;
            subtask.duration = schedule.duration()?;

            let mut tracker = ctx.open()?;
            let subtask = tracker.create_subtask(subtask)?;
            let human = describe_one(
                format!("subtask added: #{}", subtask.id()),
                &Entity::from(subtask.clone()),
            );
            ctx.emit("subtask add", &subtask, &human)
        }
        SubtaskCommands::List => {
            let tracker = ctx.open()?;
            let subtasks = tracker.get_all_subtasks();
            let entities: Vec<Entity> = subtasks.iter().cloned().map(Entity::from).collect();
            ctx.emit("subtask list", &subtasks, &describe_many("subtasks", &entities))
        }
        SubtaskCommands::Show { id } => {
            let mut tracker = ctx.open()?;
            let subtask = tracker.get_subtask(id)?;
            let human = describe_one(format!("subtask #{id}"), &Entity::from(subtask.clone()));
            ctx.emit("subtask show", &subtask, &human)
        }
        SubtaskCommands::Update {
            id,
            name,
            description,
            status,
            schedule,
            unschedule,
        } => {
            let mut tracker = ctx.open()?;
            let mut subtask = tracker.get_subtask(id)?;
            if let Some(name) = name {
                subtask.name = name;
            }
            if let Some(description) = description {
                subtask.description = description;
            }
            if let Some(status) = status {
                subtask.status = parse_status(&status)?;
            }
            if unschedule {
                subtask.start_time = None;
                subtask.duration = None;
            }
            if let Some(start) = schedule.start_time()? {
                subtask.start_time = Some(start);
            }
            if let Some(duration) = schedule.duration()? {
                subtask.duration = Some(duration);
            }

            let subtask = tracker.update_subtask(subtask)?;
            let human = describe_one(
                format!("subtask updated: #{id}"),
                &Entity::from(subtask.clone()),
            );
            ctx.emit("subtask update", &subtask, &human)
        }
        SubtaskCommands::Rm { id } => {
            let mut tracker = ctx.open()?;
            let removed = tracker.delete_subtask(id)?;
            ctx.emit("subtask rm", &removed, &removal(id, removed.is_some()))
        }
        SubtaskCommands::Clear => {
            let mut tracker = ctx.open()?;
            let count = tracker.get_all_subtasks().len();
            tracker.delete_all_subtasks()?;
            let human = HumanOutput::new(format!("subtasks cleared: {count}"));
            ctx.emit("subtask clear", &serde_json::json!({ "deleted": count }), &human)
        }
    }
}

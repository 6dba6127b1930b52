//! tracker task command implementation

use clap::Subcommand;

use super::{describe_many, describe_one, parse_status, Context, ScheduleArgs};
use crate::error::Result;
use crate::output::HumanOutput;
use crate::task::{Entity, Task, TaskId};

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task name
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

    /// List all tasks
    List,

    /// Show one task
    Show {
        /// Task ID
        id: TaskId,
    },

    /// Change fields of an existing task
    Update {
        /// Task ID
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

    /// Delete a task
    Rm {
        /// Task ID
        id: TaskId,
    },

    /// Delete every task
    Clear,
}

pub(crate) fn run(ctx: &Context, cmd: TaskCommands) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            name,
            description,
            status,
            schedule,
        } => {
            let mut task = Task::new(name, description, parse_status(&status)?);
            task.start_time = schedule.start_time()?;
            task.duration = schedule.duration()?;

            let mut tracker = ctx.open()?;
            let task = tracker.create_task(task)?;
            let entity = Entity::from(task.clone());
            let human = describe_one(format!("task added: #{}", task.id()), &entity);
            ctx.emit("task add", &task, &human)
        }
        TaskCommands::List => {
            let tracker = ctx.open()?;
            let tasks = tracker.get_all_tasks();
            let entities: Vec<Entity> = tasks.iter().cloned().map(Entity::from).collect();
            ctx.emit("task list", &tasks, &describe_many("tasks", &entities))
        }
        TaskCommands::Show { id } => {
            let mut tracker = ctx.open()?;
            let task = tracker.get_task(id)?;
            let human = describe_one(format!("task #{id}"), &Entity::from(task.clone()));
            ctx.emit("task show", &task, &human)
        }
        TaskCommands::Update {
            id,
            name,
            description,
            status,
            schedule,
            unschedule,
        } => {
            let mut tracker = ctx.open()?;
            let mut task = tracker.get_task(id)?;
            if let Some(name) = name {
                task.name = name;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(status) = status {
                task.status = parse_status(&status)?;
            }
            if unschedule {
                task.start_time = None;
                task.duration = None;
            }
            if let Some(start) = schedule.start_time()? {
                task.start_time = Some(start);
            }
            if let Some(duration) = schedule.duration()? {
                task.duration = Some(duration);
            }

            let task = tracker.update_task(task)?;
            let human = describe_one(format!("task updated: #{id}"), &Entity::from(task.clone()));
            ctx.emit("task update", &task, &human)
        }
        TaskCommands::Rm { id } => {
            let mut tracker = ctx.open()?;
            let removed = tracker.delete_task(id)?;
            ctx.emit("task rm", &removed, &removal(id, removed.is_some()))
        }
        TaskCommands::Clear => {
            let mut tracker = ctx.open()?;
            let count = tracker.get_all_tasks().len();
            tracker.delete_all_tasks()?;
            let human = HumanOutput::new(format!("tasks cleared: {count}"));
            ctx.emit("task clear", &serde_json::json!({ "deleted": count }), &human)
        }
    }
}

pub(super) fn removal(id: TaskId, deleted: bool) -> HumanOutput {
    let mut human = if deleted {
        HumanOutput::new(format!("deleted #{id}"))
    } else {
        HumanOutput::new(format!("nothing to delete for #{id}"))
    };
    if !deleted {
        human.push_warning(format!("no record with id {id}"));
    }
    human
}

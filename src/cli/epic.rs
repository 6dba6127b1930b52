//! tracker epic command implementation
//!
//! Epic status, start time and duration are derived from the subtasks, so
//! only the name and description can be edited here.

use clap::Subcommand;

use super::task::removal;
use super::{describe_many, describe_one, Context};
use crate::error::Result;
use crate::output::HumanOutput;
use crate::task::{Entity, Epic, TaskId};

/// Epic subcommands
#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an epic
    Add {
        /// Epic name
        name: String,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List all epics
    List,

    /// Show one epic
    Show {
        /// Epic ID
        id: TaskId,
    },

    /// List the subtasks of an epic
    Subtasks {
        /// Epic ID
        id: TaskId,
    },

    /// Rename or redescribe an epic
    Update {
        /// Epic ID
        id: TaskId,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete an epic and its subtasks
    Rm {
        /// Epic ID
        id: TaskId,
    },

    /// Delete every epic and every subtask
    Clear,
}

pub(crate) fn run(ctx: &Context, cmd: EpicCommands) -> Result<()> {
    match cmd {
        EpicCommands::Add { name, description } => {
            let mut tracker = ctx.open()?;
            let epic = tracker.create_epic(Epic::new(name, description))?;
            let human = describe_one(format!("epic added: #{}", epic.id()), &Entity::from(epic.clone()));
            ctx.emit("epic add", &epic, &human)
        }
        EpicCommands::List => {
            let tracker = ctx.open()?;
            let epics = tracker.get_all_epics();
            let entities: Vec<Entity> = epics.iter().cloned().map(Entity::from).collect();
            ctx.emit("epic list", &epics, &describe_many("epics", &entities))
        }
        EpicCommands::Show { id } => {
            let mut tracker = ctx.open()?;
            let epic = tracker.get_epic(id)?;
            let mut human = describe_one(format!("epic #{id}"), &Entity::from(epic.clone()));
            let subtask_ids: Vec<String> = epic.subtask_ids().iter().map(|id| format!("#{id}")).collect();
            if !subtask_ids.is_empty() {
                human.push_summary("subtasks", subtask_ids.join(", "));
            }
            ctx.emit("epic show", &epic, &human)
        }
        EpicCommands::Subtasks { id } => {
            let tracker = ctx.open()?;
            let subtasks = tracker.require_epic_subtasks(id)?;
            let entities: Vec<Entity> = subtasks.iter().cloned().map(Entity::from).collect();
            let human = describe_many(&format!("subtasks of epic #{id}"), &entities);
            ctx.emit("epic subtasks", &subtasks, &human)
        }
        EpicCommands::Update {
            id,
            name,
            description,
        } => {
            let mut tracker = ctx.open()?;
            let current = tracker.get_epic(id)?;
            let epic = Epic::with_id(
                id,
                name.unwrap_or_else(|| current.name.clone()),
                description.unwrap_or_else(|| current.description.clone()),
            );
            let epic = tracker.update_epic(epic)?;
            let human = describe_one(format!("epic updated: #{id}"), &Entity::from(epic.clone()));
            ctx.emit("epic update", &epic, &human)
        }
        EpicCommands::Rm { id } => {
            let mut tracker = ctx.open()?;
            let removed = tracker.delete_epic(id)?;
            let mut human = removal(id, removed.is_some());
            if let Some(epic) = &removed {
                if !epic.subtask_ids().is_empty() {
                    human.push_summary("subtasks deleted", epic.subtask_ids().len().to_string());
                }
            }
            ctx.emit("epic rm", &removed, &human)
        }
        EpicCommands::Clear => {
            let mut tracker = ctx.open()?;
            let epics = tracker.get_all_epics().len();
            let subtasks = tracker.get_all_subtasks().len();
            tracker.delete_all_epics()?;
            let mut human = HumanOutput::new(format!("epics cleared: {epics}"));
            human.push_summary("subtasks deleted", subtasks.to_string());
            ctx.emit(
                "epic clear",
                &serde_json::json!({ "deleted": epics, "subtasks_deleted": subtasks }),
                &human,
            )
        }
    }
}

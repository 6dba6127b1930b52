//! Entity model for the tracker.
//!
//! Three kinds share one id space: plain tasks, epics, and subtasks that
//! belong to an epic. Records compare and hash by id only, so an updated
//! copy of a record is "the same" record wherever sets or the history
//! care about identity.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier assigned by the store. Zero means "not stored yet".
pub type TaskId = u64;

/// Id carried by records that have not been through a create operation.
pub const UNASSIGNED_ID: TaskId = 0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "NEW",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NEW" => Ok(Status::New),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "DONE" => Ok(Status::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown status '{other}' (expected NEW|IN_PROGRESS|DONE)"
            ))),
        }
    }
}

/// Discriminator for the three entity kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Task,
    Epic,
    Subtask,
}

impl TaskKind {
    /// Upper-case tag used in data files
    pub fn code(&self) -> &'static str {
        match self {
            TaskKind::Task => "TASK",
            TaskKind::Epic => "EPIC",
            TaskKind::Subtask => "SUBTASK",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskKind::Task => "Task",
            TaskKind::Epic => "Epic",
            TaskKind::Subtask => "Subtask",
        };
        f.write_str(label)
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TASK" => Ok(TaskKind::Task),
            "EPIC" => Ok(TaskKind::Epic),
            "SUBTASK" => Ok(TaskKind::Subtask),
            other => Err(Error::InvalidArgument(format!(
                "unknown task type '{other}' (expected TASK|EPIC|SUBTASK)"
            ))),
        }
    }
}

/// `[start, start + duration)`, present only when both halves are set.
pub fn end_time(start: Option<NaiveDateTime>, duration: Option<Duration>) -> Option<NaiveDateTime> {
    match (start, duration) {
        (Some(start), Some(duration)) => start.checked_add_signed(duration),
        _ => None,
    }
}

/// A plain unit of work.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    pub name: String,
    pub description: String,
    pub status: Status,
    #[serde(with = "minutes")]
    pub duration: Option<Duration>,
    pub start_time: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(name: impl Into<String>, description: impl Into<String>, status: Status) -> Self {
        Self::with_id(UNASSIGNED_ID, name, description, status)
    }

    /// Build a record for an id the store already knows (updates, loading).
    pub fn with_id(
        id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            status,
            duration: None,
            start_time: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration)
    }

    pub(crate) fn assign_id(&mut self, id: TaskId) {
        self.id = id;
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A task composed of subtasks.
///
/// Status, start time and duration are derived from the subtasks by the
/// store and cannot be set by callers. The subtask list is likewise only
/// changed by the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    id: TaskId,
    pub name: String,
    pub description: String,
    status: Status,
    #[serde(serialize_with = "minutes::serialize_required")]
    duration: Duration,
    start_time: Option<NaiveDateTime>,
    subtask_ids: Vec<TaskId>,
}

impl Epic {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_id(UNASSIGNED_ID, name, description)
    }

    pub fn with_id(id: TaskId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            status: Status::New,
            duration: Duration::zero(),
            start_time: None,
            subtask_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    /// Earliest subtask start plus the summed subtask durations.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, Some(self.duration))
    }

    /// Subtask ids in creation order.
    pub fn subtask_ids(&self) -> &[TaskId] {
        &self.subtask_ids
    }

    pub(crate) fn push_subtask(&mut self, subtask_id: TaskId) {
        if !self.subtask_ids.contains(&subtask_id) {
            self.subtask_ids.push(subtask_id);
        }
    }

    pub(crate) fn remove_subtask(&mut self, subtask_id: TaskId) {
        self.subtask_ids.retain(|id| *id != subtask_id);
    }

    pub(crate) fn clear_subtasks(&mut self) {
        self.subtask_ids.clear();
    }

    pub(crate) fn set_derived(
        &mut self,
        status: Status,
        start_time: Option<NaiveDateTime>,
        duration: Duration,
    ) {
        self.status = status;
        self.start_time = start_time;
        self.duration = duration;
    }
}

impl PartialEq for Epic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Epic {}

impl Hash for Epic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A task owned by exactly one epic. The owning epic never changes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    id: TaskId,
    epic_id: TaskId,
    pub name: String,
    pub description: String,
    pub status: Status,
    #[serde(with = "minutes")]
    pub duration: Option<Duration>,
    pub start_time: Option<NaiveDateTime>,
}

impl Subtask {
    pub fn new(
        epic_id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
        status: Status,
    ) -> Self {
        Self::with_id(UNASSIGNED_ID, epic_id, name, description, status)
    }

    pub fn with_id(
        id: TaskId,
        epic_id: TaskId,
        name: impl Into<String>,
        description: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            id,
            epic_id,
            name: name.into(),
            description: description.into(),
            status,
            duration: None,
            start_time: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn epic_id(&self) -> TaskId {
        self.epic_id
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time, self.duration)
    }

    pub(crate) fn assign_id(&mut self, id: TaskId) {
        self.id = id;
    }
}

impl PartialEq for Subtask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subtask {}

impl Hash for Subtask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Any stored record, tagged by kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Entity {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl Entity {
    pub fn id(&self) -> TaskId {
        match self {
            Entity::Task(task) => task.id(),
            Entity::Epic(epic) => epic.id(),
            Entity::Subtask(subtask) => subtask.id(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Entity::Task(_) => TaskKind::Task,
            Entity::Epic(_) => TaskKind::Epic,
            Entity::Subtask(_) => TaskKind::Subtask,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Task(task) => &task.name,
            Entity::Epic(epic) => &epic.name,
            Entity::Subtask(subtask) => &subtask.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Entity::Task(task) => &task.description,
            Entity::Epic(epic) => &epic.description,
            Entity::Subtask(subtask) => &subtask.description,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Entity::Task(task) => task.status,
            Entity::Epic(epic) => epic.status(),
            Entity::Subtask(subtask) => subtask.status,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Entity::Task(task) => task.duration,
            Entity::Epic(epic) => Some(epic.duration()),
            Entity::Subtask(subtask) => subtask.duration,
        }
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        match self {
            Entity::Task(task) => task.start_time,
            Entity::Epic(epic) => epic.start_time(),
            Entity::Subtask(subtask) => subtask.start_time,
        }
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        end_time(self.start_time(), self.duration())
    }

    /// Owning epic, for subtasks.
    pub fn epic_id(&self) -> Option<TaskId> {
        match self {
            Entity::Subtask(subtask) => Some(subtask.epic_id()),
            _ => None,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl From<Task> for Entity {
    fn from(task: Task) -> Self {
        Entity::Task(task)
    }
}

impl From<Epic> for Entity {
    fn from(epic: Epic) -> Self {
        Entity::Epic(epic)
    }
}

impl From<Subtask> for Entity {
    fn from(subtask: Subtask) -> Self {
        Entity::Subtask(subtask)
    }
}

/// Durations travel as whole minutes.
pub mod minutes {
    use chrono::Duration;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// `None` when the count is beyond what a duration can hold.
    pub fn from_minutes(minutes: i64) -> Option<Duration> {
        Duration::try_minutes(minutes)
    }

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.num_minutes()),
            None => serializer.serialize_none(),
        }
    }

    pub fn serialize_required<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let Some(minutes) = Option::<i64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        from_minutes(minutes)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("duration of {minutes} minutes is out of range")))
    }
}

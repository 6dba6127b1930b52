//! In-memory task store.
//!
//! `TaskManager` owns every record, hands out ids from one shared counter,
//! keeps epics' derived status and schedule in step with their subtasks,
//! and drives the history tracker and the scheduling index on each
//! mutation. Checks run before any state is written, so a rejected call
//! leaves the store untouched.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

use crate::error::{Error, Result};
use crate::history::HistoryTracker;
use crate::schedule::Timeline;
use crate::task::{end_time, Entity, Epic, Status, Subtask, Task, TaskId, TaskKind, UNASSIGNED_ID};

const FIRST_ID: TaskId = 1;

#[derive(Debug, Clone)]
pub struct TaskManager {
    next_id: TaskId,
    tasks: BTreeMap<TaskId, Task>,
    epics: BTreeMap<TaskId, Epic>,
    subtasks: BTreeMap<TaskId, Subtask>,
    timeline: Timeline,
    history: HistoryTracker,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new(HistoryTracker::new())
    }
}

impl TaskManager {
    pub fn new(history: HistoryTracker) -> Self {
        Self {
            next_id: FIRST_ID,
            tasks: BTreeMap::new(),
            epics: BTreeMap::new(),
            subtasks: BTreeMap::new(),
            timeline: Timeline::new(),
            history,
        }
    }

    /// Id the next create call will hand out.
    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.epics.is_empty() && self.subtasks.is_empty()
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub fn create_task(&mut self, mut task: Task) -> Result<Task> {
        ensure_unassigned(TaskKind::Task, task.id())?;
        ensure_schedule(task.start_time, task.duration)?;
        self.ensure_free_slot(task.id(), task.start_time, task.duration)?;

        let id = self.allocate_id();
        task.assign_id(id);
        self.timeline.upsert(id, task.start_time, task.duration);
        self.tasks.insert(id, task.clone());
        tracing::debug!(id, name = %task.name, "task created");
        Ok(task)
    }

    pub fn get_task(&mut self, id: TaskId) -> Result<Task> {
        let task = self
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(TaskKind::Task, id))?;
        self.history.add(task.clone().into());
        Ok(task)
    }

    pub fn update_task(&mut self, task: Task) -> Result<Task> {
        let id = task.id();
        if !self.tasks.contains_key(&id) {
            return Err(Error::not_found(TaskKind::Task, id));
        }
        ensure_schedule(task.start_time, task.duration)?;
        self.ensure_free_slot(id, task.start_time, task.duration)?;

        self.timeline.upsert(id, task.start_time, task.duration);
        self.tasks.insert(id, task.clone());
        tracing::debug!(id, "task updated");
        Ok(task)
    }

    /// Absent ids are ignored.
    pub fn delete_task(&mut self, id: TaskId) -> Option<Task> {
        let task = self.tasks.remove(&id)?;
        self.history.remove(id);
        self.timeline.remove(id);
        tracing::debug!(id, "task deleted");
        Some(task)
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    pub fn delete_all_tasks(&mut self) {
        for id in self.tasks.keys() {
            self.history.remove(*id);
            self.timeline.remove(*id);
        }
        tracing::debug!(count = self.tasks.len(), "all tasks deleted");
        self.tasks.clear();
    }

    // =========================================================================
    // Epics
    // =========================================================================

    /// Only name and description are taken; the epic starts empty.
    pub fn create_epic(&mut self, epic: Epic) -> Result<Epic> {
        ensure_unassigned(TaskKind::Epic, epic.id())?;
        let id = self.allocate_id();
        let epic = Epic::with_id(id, epic.name, epic.description);
        self.epics.insert(id, epic.clone());
        tracing::debug!(id, name = %epic.name, "epic created");
        Ok(epic)
    }

    pub fn get_epic(&mut self, id: TaskId) -> Result<Epic> {
        let epic = self
            .epics
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(TaskKind::Epic, id))?;
        self.history.add(epic.clone().into());
        Ok(epic)
    }

    /// Only name and description are taken from `epic`; the derived fields
    /// and the subtask list of the stored epic are kept.
    pub fn update_epic(&mut self, epic: Epic) -> Result<Epic> {
        let id = epic.id();
        let stored = self
            .epics
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(TaskKind::Epic, id))?;
        stored.name = epic.name;
        stored.description = epic.description;
        let updated = stored.clone();
        tracing::debug!(id, "epic updated");
        Ok(updated)
    }

    /// Removes the epic together with all of its subtasks.
    pub fn delete_epic(&mut self, id: TaskId) -> Option<Epic> {
        let epic = self.epics.remove(&id)?;
        self.history.remove(id);
        for subtask_id in epic.subtask_ids() {
            self.drop_subtask(*subtask_id);
        }
        tracing::debug!(id, subtasks = epic.subtask_ids().len(), "epic deleted");
        Some(epic)
    }

    pub fn get_all_epics(&self) -> Vec<Epic> {
        self.epics.values().cloned().collect()
    }

    /// Subtasks cannot outlive their epic, so they go too.
    pub fn delete_all_epics(&mut self) {
        for id in self.epics.keys() {
            self.history.remove(*id);
        }
        let subtask_ids: Vec<TaskId> = self.subtasks.keys().copied().collect();
        for id in subtask_ids {
            self.drop_subtask(id);
        }
        tracing::debug!(count = self.epics.len(), "all epics deleted");
        self.epics.clear();
    }

    /// Subtasks of an epic in the epic's order; empty for unknown epics.
    pub fn get_epic_subtasks(&self, epic_id: TaskId) -> Vec<Subtask> {
        let Some(epic) = self.epics.get(&epic_id) else {
            return Vec::new();
        };
        epic.subtask_ids()
            .iter()
            .filter_map(|id| self.subtasks.get(id).cloned())
            .collect()
    }

    /// Existence check that leaves the history alone.
    pub fn contains_epic(&self, id: TaskId) -> bool {
        self.epics.contains_key(&id)
    }

    // =========================================================================
    // Subtasks
    // =========================================================================

    pub fn create_subtask(&mut self, mut subtask: Subtask) -> Result<Subtask> {
        ensure_unassigned(TaskKind::Subtask, subtask.id())?;
        let epic_id = subtask.epic_id();
        if !self.epics.contains_key(&epic_id) {
            return Err(Error::not_found(TaskKind::Epic, epic_id));
        }
        ensure_schedule(subtask.start_time, subtask.duration)?;
        self.ensure_free_slot(subtask.id(), subtask.start_time, subtask.duration)?;
        let summary = self.summarize_epic(epic_id, Some(&subtask))?;

        let id = self.allocate_id();
        subtask.assign_id(id);
        self.timeline.upsert(id, subtask.start_time, subtask.duration);
        self.subtasks.insert(id, subtask.clone());
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.push_subtask(id);
        }
        self.apply_summary(epic_id, summary);
        tracing::debug!(id, epic_id, name = %subtask.name, "subtask created");
        Ok(subtask)
    }

    pub fn get_subtask(&mut self, id: TaskId) -> Result<Subtask> {
        let subtask = self
            .subtasks
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(TaskKind::Subtask, id))?;
        self.history.add(subtask.clone().into());
        Ok(subtask)
    }

    pub fn update_subtask(&mut self, subtask: Subtask) -> Result<Subtask> {
        let id = subtask.id();
        let stored = self
            .subtasks
            .get(&id)
            .ok_or_else(|| Error::not_found(TaskKind::Subtask, id))?;
        if stored.epic_id() != subtask.epic_id() {
            return Err(Error::Validation(format!(
                "subtask {id} belongs to epic {}; its epic cannot be changed to {}",
                stored.epic_id(),
                subtask.epic_id()
            )));
        }
        ensure_schedule(subtask.start_time, subtask.duration)?;
        self.ensure_free_slot(id, subtask.start_time, subtask.duration)?;
        let epic_id = subtask.epic_id();
        let summary = self.summarize_epic(epic_id, Some(&subtask))?;

        self.timeline.upsert(id, subtask.start_time, subtask.duration);
        self.subtasks.insert(id, subtask.clone());
        self.apply_summary(epic_id, summary);
        tracing::debug!(id, epic_id, "subtask updated");
        Ok(subtask)
    }

    /// Absent ids are ignored.
    pub fn delete_subtask(&mut self, id: TaskId) -> Option<Subtask> {
        let subtask = self.drop_subtask(id)?;
        let epic_id = subtask.epic_id();
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.remove_subtask(id);
        }
        self.recompute_epic(epic_id);
        tracing::debug!(id, epic_id, "subtask deleted");
        Some(subtask)
    }

    pub fn get_all_subtasks(&self) -> Vec<Subtask> {
        self.subtasks.values().cloned().collect()
    }

    pub fn delete_all_subtasks(&mut self) {
        let ids: Vec<TaskId> = self.subtasks.keys().copied().collect();
        for id in ids {
            self.drop_subtask(id);
        }
        let epic_ids: Vec<TaskId> = self.epics.keys().copied().collect();
        for epic_id in epic_ids {
            if let Some(epic) = self.epics.get_mut(&epic_id) {
                epic.clear_subtasks();
            }
            self.recompute_epic(epic_id);
        }
        tracing::debug!("all subtasks deleted");
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Tasks and subtasks that have a start time, earliest first.
    pub fn get_prioritized_tasks(&self) -> Vec<Entity> {
        self.timeline
            .ordered_ids()
            .into_iter()
            .filter_map(|id| {
                if let Some(task) = self.tasks.get(&id) {
                    return Some(Entity::Task(task.clone()));
                }
                self.subtasks
                    .get(&id)
                    .map(|subtask| Entity::Subtask(subtask.clone()))
            })
            .collect()
    }

    pub fn get_history(&self) -> Vec<Entity> {
        self.history.list()
    }

    /// Every record, tasks then epics then subtasks, each in id order.
    pub fn entities(&self) -> Vec<Entity> {
        let tasks = self.tasks.values().cloned().map(Entity::Task);
        let epics = self.epics.values().cloned().map(Entity::Epic);
        let subtasks = self.subtasks.values().cloned().map(Entity::Subtask);
        tasks.chain(epics).chain(subtasks).collect()
    }

    // =========================================================================
    // Bulk load
    // =========================================================================

    /// Fill an empty store from flat records.
    ///
    /// Records are partitioned by kind, the id counter moves past the
    /// largest id, and subtasks are linked back into their epics (in id
    /// order) before every epic is recomputed. Nothing is kept if any
    /// record is rejected.
    pub fn load(&mut self, entities: impl IntoIterator<Item = Entity>) -> Result<()> {
        if !self.is_empty() {
            return Err(Error::Validation(
                "records can only be loaded into an empty store".to_string(),
            ));
        }

        let mut staged = TaskManager::new(HistoryTracker::new());
        for entity in entities {
            staged.stage(entity)?;
        }

        let links: Vec<(TaskId, TaskId)> = staged
            .subtasks
            .values()
            .map(|subtask| (subtask.id(), subtask.epic_id()))
            .collect();
        for (subtask_id, epic_id) in links {
            let epic = staged.epics.get_mut(&epic_id).ok_or_else(|| {
                Error::Validation(format!(
                    "subtask {subtask_id} references missing epic {epic_id}"
                ))
            })?;
            epic.push_subtask(subtask_id);
        }
        let epic_ids: Vec<TaskId> = staged.epics.keys().copied().collect();
        for epic_id in epic_ids {
            let summary = staged.summarize_epic(epic_id, None)?;
            staged.apply_summary(epic_id, summary);
        }

        self.next_id = staged.next_id;
        self.tasks = staged.tasks;
        self.epics = staged.epics;
        self.subtasks = staged.subtasks;
        self.timeline = staged.timeline;
        tracing::debug!(
            tasks = self.tasks.len(),
            epics = self.epics.len(),
            subtasks = self.subtasks.len(),
            next_id = self.next_id,
            "records loaded"
        );
        Ok(())
    }

    fn stage(&mut self, entity: Entity) -> Result<()> {
        let id = entity.id();
        if id == UNASSIGNED_ID {
            return Err(Error::Validation(format!(
                "{} record without an id",
                entity.kind()
            )));
        }
        if self.contains_id(id) {
            return Err(Error::Validation(format!("duplicate id {id}")));
        }
        if entity.kind() != TaskKind::Epic {
            ensure_schedule(entity.start_time(), entity.duration())?;
            self.ensure_free_slot(id, entity.start_time(), entity.duration())?;
            self.timeline
                .upsert(id, entity.start_time(), entity.duration());
        }

        match entity {
            Entity::Task(task) => {
                self.tasks.insert(id, task);
            }
            Entity::Epic(epic) => {
                // derived state and links are rebuilt from the subtasks
                let epic = Epic::with_id(id, epic.name, epic.description);
                self.epics.insert(id, epic);
            }
            Entity::Subtask(subtask) => {
                self.subtasks.insert(id, subtask);
            }
        }

        if id >= self.next_id {
            self.next_id = id + 1;
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn contains_id(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
            || self.epics.contains_key(&id)
            || self.subtasks.contains_key(&id)
    }

    fn ensure_free_slot(
        &self,
        id: TaskId,
        start: Option<NaiveDateTime>,
        duration: Option<Duration>,
    ) -> Result<()> {
        let exclude = (id != UNASSIGNED_ID).then_some(id);
        match self.timeline.find_conflict(start, duration, exclude) {
            Some(conflicting_id) => {
                tracing::debug!(id, conflicting_id, "schedule conflict");
                Err(Error::ScheduleConflict { id, conflicting_id })
            }
            None => Ok(()),
        }
    }

    /// Remove a subtask from the maps, history and timeline without
    /// touching its epic.
    fn drop_subtask(&mut self, id: TaskId) -> Option<Subtask> {
        let subtask = self.subtasks.remove(&id)?;
        self.history.remove(id);
        self.timeline.remove(id);
        Some(subtask)
    }

    /// Derived fields of an epic, with `pending` replacing the stored
    /// subtask of the same id or, for a subtask not yet linked, joining
    /// the list. Fails when the summed duration is out of range.
    fn summarize_epic(&self, epic_id: TaskId, pending: Option<&Subtask>) -> Result<EpicSummary> {
        let ids = self
            .epics
            .get(&epic_id)
            .map(Epic::subtask_ids)
            .unwrap_or_default();
        let mut subtasks: Vec<&Subtask> = ids
            .iter()
            .filter_map(|id| match pending {
                Some(pending) if pending.id() == *id => Some(pending),
                _ => self.subtasks.get(id),
            })
            .collect();
        if let Some(pending) = pending {
            if !ids.contains(&pending.id()) {
                subtasks.push(pending);
            }
        }

        let status = derive_status(subtasks.iter().map(|subtask| subtask.status));
        let start_time = subtasks.iter().filter_map(|subtask| subtask.start_time).min();
        let duration = subtasks
            .iter()
            .filter_map(|subtask| subtask.duration)
            .try_fold(Duration::zero(), |total, duration| total.checked_add(&duration))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "total duration of epic {epic_id} would be out of range"
                ))
            })?;

        Ok(EpicSummary {
            status,
            start_time,
            duration,
        })
    }

    fn apply_summary(&mut self, epic_id: TaskId, summary: EpicSummary) {
        if let Some(epic) = self.epics.get_mut(&epic_id) {
            epic.set_derived(summary.status, summary.start_time, summary.duration);
        }
    }

    /// Recompute after subtasks left the epic.
    fn recompute_epic(&mut self, epic_id: TaskId) {
        match self.summarize_epic(epic_id, None) {
            Ok(summary) => self.apply_summary(epic_id, summary),
            // a subset of non-negative durations cannot exceed an in-range total
            Err(err) => tracing::warn!(epic_id, error = %err, "epic keeps its previous derived fields"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EpicSummary {
    status: Status,
    start_time: Option<NaiveDateTime>,
    duration: Duration,
}

/// NEW when there are no subtasks or all are NEW, DONE when all are DONE,
/// IN_PROGRESS otherwise.
pub fn derive_status(statuses: impl IntoIterator<Item = Status>) -> Status {
    let mut all_new = true;
    let mut all_done = true;
    for status in statuses {
        all_new &= status == Status::New;
        all_done &= status == Status::Done;
    }
    if all_new {
        Status::New
    } else if all_done {
        Status::Done
    } else {
        Status::InProgress
    }
}

fn ensure_unassigned(kind: TaskKind, id: TaskId) -> Result<()> {
    if id != UNASSIGNED_ID {
        return Err(Error::Validation(format!(
            "new {} records must not carry an id (got {id})",
            kind.code().to_ascii_lowercase()
        )));
    }
    Ok(())
}

/// Durations are non-negative, and a scheduled record needs an end time
/// the calendar can represent.
fn ensure_schedule(start: Option<NaiveDateTime>, duration: Option<Duration>) -> Result<()> {
    let Some(duration) = duration else {
        return Ok(());
    };
    if duration < Duration::zero() {
        return Err(Error::Validation(format!(
            "duration must not be negative (got {} minutes)",
            duration.num_minutes()
        )));
    }
    if let Some(start) = start {
        if end_time(Some(start), Some(duration)).is_none() {
            return Err(Error::Validation(format!(
                "end time of {start} plus {} minutes is out of range",
                duration.num_minutes()
            )));
        }
    }
    Ok(())
}

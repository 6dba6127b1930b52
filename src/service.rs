//! File-backed tracker.
//!
//! `Tracker` fronts a [`TaskManager`] and, when a [`TaskFile`] is attached,
//! rewrites the file after every mutation the store accepted. A failed
//! save is reported as [`Error::Persistence`] but the in-memory change is
//! not rolled back: memory is ahead of disk until the next successful save.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::HistoryTracker;
use crate::manager::TaskManager;
use crate::storage::TaskFile;
use crate::task::{Entity, Epic, Subtask, Task, TaskId};

#[derive(Debug)]
pub struct Tracker {
    manager: TaskManager,
    file: Option<TaskFile>,
}

impl Tracker {
    pub fn new(manager: TaskManager, file: Option<TaskFile>) -> Self {
        Self { manager, file }
    }

    /// Purely in-memory tracker.
    pub fn in_memory(history: HistoryTracker) -> Self {
        Self::new(TaskManager::new(history), None)
    }

    /// Tracker backed by `file`, loading whatever it already holds.
    pub fn open(file: TaskFile, history: HistoryTracker) -> Result<Self> {
        let mut manager = TaskManager::new(history);
        file.load_into(&mut manager)?;
        Ok(Self::new(manager, Some(file)))
    }

    /// Tracker as described by the configuration's storage and history sections.
    pub fn from_config(config: &Config) -> Result<Self> {
        let history = config.history.tracker();
        match &config.storage.path {
            Some(path) => Self::open(config.storage.task_file(path), history),
            None => Ok(Self::in_memory(history)),
        }
    }

    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    pub fn file(&self) -> Option<&TaskFile> {
        self.file.as_ref()
    }

    fn persist(&self) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        file.save(&self.manager).inspect_err(|err| {
            tracing::warn!(error = %err, "change kept in memory but not saved");
        })
    }

    fn committed<T>(&self, value: T) -> Result<T> {
        self.persist()?;
        Ok(value)
    }

    // Tasks

    pub fn create_task(&mut self, task: Task) -> Result<Task> {
        let task = self.manager.create_task(task)?;
        self.committed(task)
    }

    pub fn get_task(&mut self, id: TaskId) -> Result<Task> {
        self.manager.get_task(id)
    }

    pub fn update_task(&mut self, task: Task) -> Result<Task> {
        let task = self.manager.update_task(task)?;
        self.committed(task)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<Option<Task>> {
        let task = self.manager.delete_task(id);
        self.committed(task)
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.manager.get_all_tasks()
    }

    pub fn delete_all_tasks(&mut self) -> Result<()> {
        self.manager.delete_all_tasks();
        self.persist()
    }

    // Epics

    pub fn create_epic(&mut self, epic: Epic) -> Result<Epic> {
        let epic = self.manager.create_epic(epic)?;
        self.committed(epic)
    }

    pub fn get_epic(&mut self, id: TaskId) -> Result<Epic> {
        self.manager.get_epic(id)
    }

    pub fn update_epic(&mut self, epic: Epic) -> Result<Epic> {
        let epic = self.manager.update_epic(epic)?;
        self.committed(epic)
    }

    pub fn delete_epic(&mut self, id: TaskId) -> Result<Option<Epic>> {
        let epic = self.manager.delete_epic(id);
        self.committed(epic)
    }

    pub fn get_all_epics(&self) -> Vec<Epic> {
        self.manager.get_all_epics()
    }

    pub fn delete_all_epics(&mut self) -> Result<()> {
        self.manager.delete_all_epics();
        self.persist()
    }

    pub fn get_epic_subtasks(&self, epic_id: TaskId) -> Vec<Subtask> {
        self.manager.get_epic_subtasks(epic_id)
    }

    /// Like [`Tracker::get_epic_subtasks`] but unknown epics are an error.
    pub fn require_epic_subtasks(&self, epic_id: TaskId) -> Result<Vec<Subtask>> {
        if !self.manager.contains_epic(epic_id) {
            return Err(Error::not_found(crate::task::TaskKind::Epic, epic_id));
        }
        Ok(self.manager.get_epic_subtasks(epic_id))
    }

    // Subtasks

    pub fn create_subtask(&mut self, subtask: Subtask) -> Result<Subtask> {
        let subtask = self.manager.create_subtask(subtask)?;
        self.committed(subtask)
    }

    pub fn get_subtask(&mut self, id: TaskId) -> Result<Subtask> {
        self.manager.get_subtask(id)
    }

    pub fn update_subtask(&mut self, subtask: Subtask) -> Result<Subtask> {
        let subtask = self.manager.update_subtask(subtask)?;
        self.committed(subtask)
    }

    pub fn delete_subtask(&mut self, id: TaskId) -> Result<Option<Subtask>> {
        let subtask = self.manager.delete_subtask(id);
        self.committed(subtask)
    }

    pub fn get_all_subtasks(&self) -> Vec<Subtask> {
        self.manager.get_all_subtasks()
    }

    pub fn delete_all_subtasks(&mut self) -> Result<()> {
        self.manager.delete_all_subtasks();
        self.persist()
    }

    // Views

    pub fn get_prioritized_tasks(&self) -> Vec<Entity> {
        self.manager.get_prioritized_tasks()
    }

    pub fn get_history(&self) -> Vec<Entity> {
        self.manager.get_history()
    }
}

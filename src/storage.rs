//! CSV file backend.
//!
//! The whole store is rewritten on every save, one row per record:
//!
//! ```text
//! id,type,name,status,description,duration,startTime,epic
//! 1,TASK,Write report,NEW,Quarterly numbers,90,2025-01-10T09:00:00,
//! 2,EPIC,Move house,IN_PROGRESS,,45,2025-02-01T10:00:00,
//! 3,SUBTASK,Pack books,DONE,,45,2025-02-01T10:00:00,2
//! ```
//!
//! Durations are whole minutes, start times ISO-8601 local date-times,
//! empty cells mean "absent". Epic rows repeat their derived fields for
//! readability only; loading rebuilds them from the subtasks.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::manager::TaskManager;
use crate::task::{minutes, Entity, Epic, Status, Subtask, Task, TaskId, TaskKind};

pub const HEADER: &str = "id,type,name,status,description,duration,startTime,epic";

const COLUMNS: usize = 8;
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_TIME_FORMATS_ACCEPTED: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Data file holding a store's records.
#[derive(Debug, Clone)]
pub struct TaskFile {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl TaskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_timeout_ms(&self) -> u64 {
        self.lock_timeout_ms
    }

    /// Records in the file; a missing file holds none.
    pub fn read(&self) -> Result<Vec<Entity>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = lock::read_locked_str(&self.path, self.lock_timeout_ms)?;
        parse(&content)
    }

    /// Build a store from the file.
    pub fn load_into(&self, manager: &mut TaskManager) -> Result<()> {
        let entities = self.read()?;
        let count = entities.len();
        manager.load(entities)?;
        tracing::info!(path = %self.path.display(), records = count, "loaded task file");
        Ok(())
    }

    /// Rewrite the file with the store's current records.
    pub fn save(&self, manager: &TaskManager) -> Result<()> {
        let content = render(&manager.entities());
        lock::write_atomic_locked(&self.path, content.as_bytes(), self.lock_timeout_ms)
            .map_err(|err| Error::persistence(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), "saved task file");
        Ok(())
    }
}

/// Render records, header first, in the order given.
pub fn render(entities: &[Entity]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + entities.len() * 48);
    out.push_str(HEADER);
    out.push('\n');
    for entity in entities {
        out.push_str(&render_row(entity));
        out.push('\n');
    }
    out
}

fn render_row(entity: &Entity) -> String {
    let duration = entity
        .duration()
        .map(|duration| duration.num_minutes().to_string())
        .unwrap_or_default();
    let start_time = entity
        .start_time()
        .map(|start| start.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_default();
    let epic = entity
        .epic_id()
        .map(|epic_id| epic_id.to_string())
        .unwrap_or_default();

    let cells = [
        entity.id().to_string(),
        entity.kind().code().to_string(),
        quote(entity.name()),
        entity.status().as_str().to_string(),
        quote(entity.description()),
        duration,
        start_time,
        epic,
    ];
    cells.join(",")
}

fn quote(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Parse file contents. Blank input and a lone header both mean "empty".
pub fn parse(content: &str) -> Result<Vec<Entity>> {
    let rows = split_rows(content)?;
    let mut entities = Vec::with_capacity(rows.len());
    for (line, cells) in rows {
        if line == 1 && cells.first().map(String::as_str) == Some("id") {
            continue;
        }
        if cells.len() == 1 && cells[0].trim().is_empty() {
            continue;
        }
        entities.push(parse_row(line, &cells)?);
    }
    Ok(entities)
}

fn parse_row(line: usize, cells: &[String]) -> Result<Entity> {
    let corrupt = |reason: String| Error::CorruptRecord { line, reason };

    if cells.len() != COLUMNS {
        return Err(corrupt(format!(
            "expected {COLUMNS} columns, found {}",
            cells.len()
        )));
    }

    let id: TaskId = cells[0]
        .trim()
        .parse()
        .map_err(|_| corrupt(format!("invalid id '{}'", cells[0])))?;
    let kind: TaskKind = cells[1]
        .parse()
        .map_err(|_| corrupt(format!("invalid type '{}'", cells[1])))?;
    let name = cells[2].clone();
    let status: Status = cells[3]
        .parse()
        .map_err(|_| corrupt(format!("invalid status '{}'", cells[3])))?;
    let description = cells[4].clone();
    let duration = parse_optional(&cells[5], |raw| {
        raw.parse::<i64>().ok().and_then(minutes::from_minutes)
    })
    .map_err(|raw| corrupt(format!("invalid duration '{raw}'")))?;
    let start_time = parse_optional(&cells[6], parse_date_time)
        .map_err(|raw| corrupt(format!("invalid start time '{raw}'")))?;

    let entity = match kind {
        TaskKind::Task => {
            let mut task = Task::with_id(id, name, description, status);
            task.duration = duration;
            task.start_time = start_time;
            Entity::Task(task)
        }
        TaskKind::Epic => Entity::Epic(Epic::with_id(id, name, description)),
        TaskKind::Subtask => {
            let epic_id: TaskId = cells[7]
                .trim()
                .parse()
                .map_err(|_| corrupt(format!("invalid epic id '{}'", cells[7])))?;
            let mut subtask = Subtask::with_id(id, epic_id, name, description, status);
            subtask.duration = duration;
            subtask.start_time = start_time;
            Entity::Subtask(subtask)
        }
    };
    Ok(entity)
}

/// Empty cell is `None`; anything else must parse.
fn parse_optional<T>(
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> std::result::Result<Option<T>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse(raw).map(Some).ok_or_else(|| raw.to_string())
}

/// ISO-8601 local date-time, with or without seconds.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS_ACCEPTED
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw.trim(), format).ok())
}

/// Split content into rows of cells, honouring quoted cells that may
/// contain commas, doubled quotes and line breaks. Each row carries the
/// 1-based line it starts on.
fn split_rows(content: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    cell.push(ch);
                }
                _ => cell.push(ch),
            }
            continue;
        }

        match ch {
            '"' if cell.is_empty() => in_quotes = true,
            ',' => cells.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                cells.push(std::mem::take(&mut cell));
                rows.push((row_line, std::mem::take(&mut cells)));
                line += 1;
                row_line = line;
            }
            _ => cell.push(ch),
        }
    }

    if in_quotes {
        return Err(Error::CorruptRecord {
            line: row_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !cell.is_empty() || !cells.is_empty() {
        cells.push(cell);
        rows.push((row_line, cells));
    }
    Ok(rows)
}

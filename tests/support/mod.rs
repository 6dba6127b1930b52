#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use tracker::history::HistoryTracker;
use tracker::service::Tracker;
use tracker::storage::TaskFile;
use tracker::task::{Status, Subtask, Task, TaskId};

/// 2025-03-01 at `hour:minute`.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .expect("date")
        .and_hms_opt(hour, minute, 0)
        .expect("time")
}

pub fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

pub fn scheduled_task(name: &str, start: NaiveDateTime, duration_min: i64) -> Task {
    Task::new(name, "", Status::New)
        .with_start_time(start)
        .with_duration(minutes(duration_min))
}

pub fn scheduled_subtask(
    epic_id: TaskId,
    name: &str,
    status: Status,
    start: NaiveDateTime,
    duration_min: i64,
) -> Subtask {
    Subtask::new(epic_id, name, "", status)
        .with_start_time(start)
        .with_duration(minutes(duration_min))
}

/// Scratch directory holding a data file.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("tasks.csv")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read_data_file(&self) -> String {
        fs::read_to_string(self.data_file()).expect("read data file")
    }

    pub fn open(&self) -> Tracker {
        Tracker::open(TaskFile::new(self.data_file()), HistoryTracker::new()).expect("open tracker")
    }
}

//! tracker - task, epic and subtask tracking library
//!
//! This library provides the core functionality for the tracker CLI and
//! its HTTP server.
//!
//! # Core Concepts
//!
//! - **Tasks, epics, subtasks**: three record kinds sharing one id space
//! - **Derived epics**: status, start and duration come from the subtasks
//! - **Schedule**: scheduled tasks and subtasks may never overlap
//! - **History**: the most recent views, each record at most once
//!
//! # Module Organization
//!
//! - `task`: Entity model and status values
//! - `history`: Ordered, de-duplicated view history
//! - `schedule`: Start-time index and overlap checks
//! - `manager`: In-memory store enforcing every invariant
//! - `storage`: CSV data file format and load/save
//! - `service`: Store plus data file, saving after every mutation
//! - `lock`: File locking and atomic writes for the data file
//! - `http`: JSON API served with axum
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `tracker.toml`
//! - `output`: Human and JSON output for CLI commands
//! - `error`: Error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod lock;
pub mod manager;
pub mod output;
pub mod schedule;
pub mod service;
pub mod storage;
pub mod task;

pub use error::{Error, Result};

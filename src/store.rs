//! Task store: the persistent side of the tracker.
//!
//! Tasks live in a single JSON snapshot at `<data_dir>/tasks.json`. Every
//! write goes through an exclusive file lock plus an atomic temp-and-rename,
//! so a daemon and concurrent one-shot commands never see partial state.
//!
//! The reminder core only consumes the read side (`get`,
//! `future_reminders`); it persists nothing of its own.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

const TASKS_FILE: &str = "tasks.json";
const TASKS_SCHEMA_VERSION: &str = "nudge.tasks.v1";

fn default_schema_version() -> String {
    TASKS_SCHEMA_VERSION.to_string()
}

fn default_next_id() -> i64 {
    1
}

/// On-disk layout of the task snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default = "default_schema_version")]
    schema_version: String,
    #[serde(default = "default_next_id")]
    next_id: i64,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl Default for TaskFile {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            next_id: default_next_id(),
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    dir: PathBuf,
}

impl TaskStore {
    /// Open a store rooted at the given directory
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory for the default store location
    pub fn default_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "nudge").ok_or_else(|| {
            Error::OperationFailed("could not determine a data directory".to_string())
        })?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Path to the snapshot file
    pub fn tasks_file(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    fn lock_file(&self) -> PathBuf {
        self.dir.join(format!("{}.lock", TASKS_FILE))
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Fetch a task by id
    pub fn get(&self, task_id: i64) -> Result<Option<Task>> {
        let file = self.read_file()?;
        Ok(file.tasks.into_iter().find(|task| task.id == task_id))
    }

    /// All tasks, in insertion order
    pub fn all(&self) -> Result<Vec<Task>> {
        Ok(self.read_file()?.tasks)
    }

    /// Incomplete tasks whose reminder is still in the future.
    ///
    /// This is the recovery feed: reminders that elapsed while the process
    /// was down are deliberately excluded.
    pub fn future_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let file = self.read_file()?;
        Ok(file
            .tasks
            .into_iter()
            .filter(|task| !task.completed)
            .filter(|task| matches!(task.reminder_at, Some(at) if at > now))
            .collect())
    }

    // =========================================================================
    // Write side (locked, atomic)
    // =========================================================================

    /// Insert a task, assigning it the next id. Returns the stored record.
    pub fn add(&self, mut task: Task) -> Result<Task> {
        self.update(|file| {
            task.id = file.next_id;
            file.next_id += 1;
            file.tasks.push(task.clone());
            Ok(task.clone())
        })
    }

    /// Apply a mutation to an existing task. Bumps `updated_at`.
    pub fn update_task<F>(&self, task_id: i64, mutator: F) -> Result<Task>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        self.update(|file| {
            let task = file
                .tasks
                .iter_mut()
                .find(|task| task.id == task_id)
                .ok_or(Error::TaskNotFound(task_id))?;
            mutator(task)?;
            task.updated_at = Utc::now();
            Ok(task.clone())
        })
    }

    /// Flip a task's completed flag. Returns the updated record.
    pub fn toggle_complete(&self, task_id: i64) -> Result<Task> {
        self.update_task(task_id, |task| {
            task.completed = !task.completed;
            Ok(())
        })
    }

    /// Remove a task, returning the removed record
    pub fn remove(&self, task_id: i64) -> Result<Task> {
        self.update(|file| {
            let idx = file
                .tasks
                .iter()
                .position(|task| task.id == task_id)
                .ok_or(Error::TaskNotFound(task_id))?;
            Ok(file.tasks.remove(idx))
        })
    }

    // =========================================================================
    // File I/O
    // =========================================================================

    fn read_file(&self) -> Result<TaskFile> {
        let path = self.tasks_file();
        if !path.exists() {
            return Ok(TaskFile::default());
        }
        read_json(&path)
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskFile) -> Result<T>,
    {
        let _lock = FileLock::acquire(self.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut file = self.read_file()?;
        let result = f(&mut file)?;

        let json = serde_json::to_string_pretty(&file)?;
        lock::write_atomic(&self.tasks_file(), json.as_bytes())?;

        Ok(result)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&content)?;
    Ok(data)
}

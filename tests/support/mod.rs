//! Shared fixtures for integration tests: recording host fakes and task
//! builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use nudge::error::{Error, Result};
use nudge::platform::{
    AudioHost, ForegroundHost, NotificationHost, NotificationSurface, TriggerPayload,
};
use nudge::schedule::Tier;
use nudge::task::Task;

pub fn task_with_reminder(id: i64, title: &str, reminder_at: DateTime<Utc>) -> Task {
    let mut task = Task::new(title);
    task.id = id;
    task.reminder_at = Some(reminder_at);
    task
}

pub fn alarm_payload(task_id: i64, title: &str) -> TriggerPayload {
    payload(task_id, title, Tier::Alarm)
}

pub fn early_payload(task_id: i64, title: &str) -> TriggerPayload {
    payload(task_id, title, Tier::EarlyWarning)
}

fn payload(task_id: i64, title: &str, tier: Tier) -> TriggerPayload {
    TriggerPayload {
        task_id,
        tier,
        title: title.to_string(),
        description: None,
        category: nudge::task::Category::Personal,
        priority: nudge::task::Priority::Medium,
    }
}

/// Records every posted and cleared surface; optionally fails all posts.
#[derive(Default)]
pub struct RecordingNotifier {
    pub posted: Mutex<Vec<(i64, NotificationSurface)>>,
    pub cleared: Mutex<Vec<i64>>,
    pub fail_posts: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<(i64, NotificationSurface)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn clears(&self) -> Vec<i64> {
        self.cleared.lock().unwrap().clone()
    }

    pub fn set_fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }
}

impl NotificationHost for RecordingNotifier {
    fn post(&self, surface_id: i64, surface: NotificationSurface) -> Result<()> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Error::Delivery("notification backend down".to_string()));
        }
        self.posted.lock().unwrap().push((surface_id, surface));
        Ok(())
    }

    fn clear(&self, surface_id: i64) -> Result<()> {
        self.cleared.lock().unwrap().push(surface_id);
        Ok(())
    }
}

/// Counts start/stop calls and tracks the playing flag.
#[derive(Default)]
pub struct RecordingAudio {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    playing: AtomicBool,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AudioHost for RecordingAudio {
    fn start_loop(&self) -> Result<()> {
        if !self.playing.swap(true, Ordering::SeqCst) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if self.playing.swap(false, Ordering::SeqCst) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Records elevated-execution enter/exit pairs.
#[derive(Default)]
pub struct RecordingForeground {
    pub entered: Mutex<Vec<i64>>,
    pub exited: Mutex<Vec<i64>>,
}

impl RecordingForeground {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enters(&self) -> Vec<i64> {
        self.entered.lock().unwrap().clone()
    }

    pub fn exits(&self) -> Vec<i64> {
        self.exited.lock().unwrap().clone()
    }
}

impl ForegroundHost for RecordingForeground {
    fn enter(&self, task_id: i64, _duration_hint: StdDuration) -> Result<()> {
        self.entered.lock().unwrap().push(task_id);
        Ok(())
    }

    fn exit(&self, task_id: i64) -> Result<()> {
        self.exited.lock().unwrap().push(task_id);
        Ok(())
    }
}

//! Registry-level scheduling behavior against the in-process timer table.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use nudge::host::InProcessTimers;
use nudge::registry::TriggerRegistry;
use nudge::schedule::{Tier, TriggerKey};
use support::task_with_reminder;

#[test]
fn far_reminder_registers_both_tiers() {
    let timers = Arc::new(InProcessTimers::new(true));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();
    let reminder_at = now + Duration::hours(2);

    let task = task_with_reminder(7, "dentist", reminder_at);
    let tiers = registry.schedule(&task, now).unwrap();
    assert_eq!(tiers, vec![Tier::EarlyWarning, Tier::Alarm]);

    let registered = timers.registered();
    assert_eq!(registered.len(), 2);

    assert_eq!(registered[0].request_id, 14);
    assert_eq!(registered[0].fire_at, reminder_at - Duration::minutes(30));
    assert_eq!(registered[0].payload.tier, Tier::EarlyWarning);

    assert_eq!(registered[1].request_id, 15);
    assert_eq!(registered[1].fire_at, reminder_at);
    assert_eq!(registered[1].payload.tier, Tier::Alarm);
    assert_eq!(registered[1].payload.title, "dentist");
}

#[test]
fn reminder_inside_warning_window_registers_alarm_only() {
    let timers = Arc::new(InProcessTimers::new(true));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();

    let task = task_with_reminder(3, "bus", now + Duration::minutes(5));
    let tiers = registry.schedule(&task, now).unwrap();
    assert_eq!(tiers, vec![Tier::Alarm]);

    let registered = timers.registered();
    assert_eq!(registered.len(), 1);
    assert_eq!(
        registered[0].request_id,
        TriggerKey::new(3, Tier::Alarm).request_id()
    );
}

#[test]
fn past_reminder_registers_nothing() {
    let timers = Arc::new(InProcessTimers::new(true));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();

    let task = task_with_reminder(4, "stale", now - Duration::minutes(1));
    assert!(registry.schedule(&task, now).unwrap().is_empty());
    assert!(timers.registered().is_empty());
}

#[test]
fn rescheduling_replaces_instead_of_accumulating() {
    let timers = Arc::new(InProcessTimers::new(true));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();

    let task = task_with_reminder(9, "review", now + Duration::hours(1));
    registry.schedule(&task, now).unwrap();

    let moved = task_with_reminder(9, "review", now + Duration::hours(3));
    registry.schedule(&moved, now).unwrap();

    let registered = timers.registered();
    assert_eq!(registered.len(), 2);
    assert!(registered
        .iter()
        .all(|reg| reg.fire_at >= now + Duration::hours(2)));
}

#[test]
fn clearing_the_reminder_cancels_stale_triggers() {
    let timers = Arc::new(InProcessTimers::new(true));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();

    let task = task_with_reminder(5, "call", now + Duration::hours(1));
    registry.schedule(&task, now).unwrap();
    assert_eq!(timers.registered().len(), 2);

    let mut cleared = task.clone();
    cleared.reminder_at = None;
    assert!(registry.schedule(&cleared, now).unwrap().is_empty());
    assert!(timers.registered().is_empty());
}

#[test]
fn cancel_is_a_noop_for_unknown_tasks() {
    let timers = Arc::new(InProcessTimers::new(true));
    let registry = TriggerRegistry::new(timers.clone());

    registry.cancel(12345).unwrap();
    assert!(timers.registered().is_empty());
}

#[test]
fn exact_wake_denied_skips_alarm_but_keeps_early_warning() {
    let timers = Arc::new(InProcessTimers::new(false));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();

    let task = task_with_reminder(8, "meds", now + Duration::hours(1));
    let tiers = registry.schedule(&task, now).unwrap();
    assert_eq!(tiers, vec![Tier::EarlyWarning]);

    let registered = timers.registered();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].payload.tier, Tier::EarlyWarning);
}

#[test]
fn exact_wake_regranted_restores_alarm_on_next_schedule() {
    let timers = Arc::new(InProcessTimers::new(false));
    let registry = TriggerRegistry::new(timers.clone());
    let now = Utc::now();
    let task = task_with_reminder(8, "meds", now + Duration::hours(1));

    registry.schedule(&task, now).unwrap();
    assert_eq!(timers.registered().len(), 1);

    timers.set_exact_wake_allowed(true);
    let tiers = registry.schedule(&task, now).unwrap();
    assert_eq!(tiers, vec![Tier::EarlyWarning, Tier::Alarm]);
    assert_eq!(timers.registered().len(), 2);
}

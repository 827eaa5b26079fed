//! Delivery controller behavior: ringing sessions, stop paths, and failure
//! handling.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use nudge::delivery::{
    alarm_surface_id, auto_dismiss_window, early_surface_id, DeliveryController, StopReason,
};
use nudge::platform::{AudioHost, Urgency};
use support::{alarm_payload, early_payload, RecordingAudio, RecordingForeground, RecordingNotifier};

struct Harness {
    notifier: Arc<RecordingNotifier>,
    audio: Arc<RecordingAudio>,
    foreground: Arc<RecordingForeground>,
    controller: DeliveryController,
}

fn harness() -> Harness {
    let notifier = Arc::new(RecordingNotifier::new());
    let audio = Arc::new(RecordingAudio::new());
    let foreground = Arc::new(RecordingForeground::new());
    let controller = DeliveryController::new(
        notifier.clone(),
        audio.clone(),
        foreground.clone(),
    );
    Harness {
        notifier,
        audio,
        foreground,
        controller,
    }
}

#[test]
fn early_warning_posts_one_dismissable_surface_without_audio() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&early_payload(4, "groceries"), now);

    let posts = h.notifier.posts();
    assert_eq!(posts.len(), 1);
    let (surface_id, surface) = &posts[0];
    assert_eq!(*surface_id, early_surface_id(4));
    assert_eq!(surface.urgency, Urgency::Medium);
    assert!(!surface.persistent);
    assert!(!surface.full_screen);
    assert!(surface.title.contains("groceries"));

    assert!(!h.audio.is_playing());
    assert!(!h.controller.is_ringing(4));
    assert!(h.foreground.enters().is_empty());
}

#[test]
fn alarm_starts_audio_foreground_and_persistent_surface() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);

    assert!(h.controller.is_ringing(4));
    assert!(h.audio.is_playing());
    assert_eq!(h.audio.start_count(), 1);
    assert_eq!(h.foreground.enters(), vec![4]);

    let posts = h.notifier.posts();
    assert_eq!(posts.len(), 1);
    let (surface_id, surface) = &posts[0];
    assert_eq!(*surface_id, alarm_surface_id(4));
    assert_eq!(surface.urgency, Urgency::Critical);
    assert!(surface.persistent);
    assert!(surface.full_screen);

    let deadline = h.controller.next_deadline().unwrap();
    assert_eq!(deadline, now + auto_dismiss_window());
}

#[test]
fn reentrant_alarm_firing_keeps_a_single_audio_stream() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);
    let first_deadline = h.controller.next_deadline().unwrap();

    let later = now + Duration::seconds(10);
    h.controller.deliver(&alarm_payload(4, "groceries"), later);

    // One audio start, one foreground entry, a refreshed countdown.
    assert_eq!(h.audio.start_count(), 1);
    assert_eq!(h.foreground.enters(), vec![4]);
    assert_eq!(h.controller.active_tasks(), vec![4]);
    let refreshed = h.controller.next_deadline().unwrap();
    assert!(refreshed > first_deadline);
    assert_eq!(refreshed, later + auto_dismiss_window());
}

#[test]
fn dismiss_stops_audio_and_clears_the_surface() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);
    assert!(h.controller.stop(4, StopReason::Dismissed));

    assert!(!h.controller.is_ringing(4));
    assert!(!h.audio.is_playing());
    assert_eq!(h.audio.stop_count(), 1);
    assert_eq!(h.foreground.exits(), vec![4]);
    assert_eq!(h.notifier.clears(), vec![alarm_surface_id(4)]);
}

#[test]
fn stop_without_a_session_is_a_noop() {
    let h = harness();

    assert!(!h.controller.stop(4, StopReason::Dismissed));
    assert_eq!(h.audio.stop_count(), 0);
    assert!(h.notifier.clears().is_empty());
    assert!(h.foreground.exits().is_empty());
}

#[test]
fn stop_is_idempotent_after_a_real_stop() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);
    assert!(h.controller.stop(4, StopReason::ViewDetails));
    assert!(!h.controller.stop(4, StopReason::ViewDetails));

    assert_eq!(h.audio.stop_count(), 1);
    assert_eq!(h.notifier.clears(), vec![alarm_surface_id(4)]);
}

#[test]
fn auto_dismiss_leaves_a_missed_reminder_trace() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);

    let expired = h
        .controller
        .expire_sessions(now + auto_dismiss_window() + Duration::seconds(1));
    assert_eq!(expired, vec![4]);
    assert!(!h.controller.is_ringing(4));
    assert!(!h.audio.is_playing());

    // The persistent surface is replaced, not cleared.
    let posts = h.notifier.posts();
    assert_eq!(posts.len(), 2);
    let (surface_id, trace) = &posts[1];
    assert_eq!(*surface_id, alarm_surface_id(4));
    assert!(!trace.persistent);
    assert_eq!(trace.title, "Missed reminder");
    assert!(h.notifier.clears().is_empty());
}

#[test]
fn expire_sessions_before_the_deadline_stops_nothing() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);
    assert!(h
        .controller
        .expire_sessions(now + Duration::seconds(5))
        .is_empty());
    assert!(h.controller.is_ringing(4));
    assert!(h.audio.is_playing());
}

#[test]
fn failed_surface_post_rolls_back_audio_and_foreground() {
    let h = harness();
    let now = Utc::now();
    h.notifier.set_fail_posts(true);

    h.controller.deliver(&alarm_payload(4, "groceries"), now);

    // Delivery is dropped, never raised, and leaves nothing running.
    assert!(!h.controller.is_ringing(4));
    assert!(!h.audio.is_playing());
    assert_eq!(h.foreground.exits(), vec![4]);
}

#[test]
fn failed_early_warning_is_swallowed() {
    let h = harness();
    h.notifier.set_fail_posts(true);

    h.controller.deliver(&early_payload(4, "groceries"), Utc::now());
    assert!(h.notifier.posts().is_empty());
    assert!(!h.controller.is_ringing(4));
}

#[test]
fn audio_keeps_looping_while_another_task_still_rings() {
    let h = harness();
    let now = Utc::now();

    h.controller.deliver(&alarm_payload(4, "groceries"), now);
    h.controller.deliver(&alarm_payload(9, "standup"), now + Duration::seconds(2));
    assert_eq!(h.audio.start_count(), 1);

    assert!(h.controller.stop(4, StopReason::Dismissed));
    assert!(h.audio.is_playing());
    assert_eq!(h.audio.stop_count(), 0);

    assert!(h.controller.stop(9, StopReason::Dismissed));
    assert!(!h.audio.is_playing());
    assert_eq!(h.audio.stop_count(), 1);
}

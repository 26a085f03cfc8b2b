//! Playback queue tests
//!
//! Run the real worker against mock synthesis and output.

mod common;

use common::{wait, TestContext, LONG};
use std::time::Duration;
use voiceverse::playback::Priority;
use voiceverse::session::Settings;

const SHORT: Duration = Duration::from_millis(30);

#[test]
fn test_normal_requests_play_in_fifo_order() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();
    let settings = Settings::default();

    let a = queue.enqueue("first", &settings, Priority::Normal).unwrap();
    let b = queue.enqueue("second", &settings, Priority::Normal).unwrap();
    let c = queue.enqueue("third", &settings, Priority::Normal).unwrap();
    assert!(a < b && b < c);

    assert!(wait(|| ctx.tts.released().len() == 3));
    assert_eq!(ctx.output.played(), ctx.tts.created_ids());
}

#[test]
fn test_interrupt_while_paused_replaces_queue() {
    let ctx = TestContext::new(LONG);
    let queue = ctx.queue();
    let settings = Settings::default();

    queue.pause();
    for text in ["one", "two", "three"] {
        queue.enqueue(text, &settings, Priority::Normal).unwrap();
    }
    assert_eq!(queue.pending_len(), 3);
    let discarded = ctx.tts.created_ids();

    let id = queue.enqueue("urgent", &settings, Priority::Interrupt).unwrap();

    let pending = queue.snapshot();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);
    assert_eq!(pending[0].priority, Priority::Interrupt);
    assert_eq!(pending[0].text, "urgent");
    for artifact in discarded {
        assert!(ctx.tts.is_released(artifact));
    }
    // Still paused, nothing reached the device
    assert!(ctx.output.played().is_empty());
    assert!(!queue.is_playback_enabled());
}

#[test]
fn test_interrupt_stops_current_playback() {
    let ctx = TestContext::new(LONG);
    let queue = ctx.queue();
    let settings = Settings::default();

    queue.enqueue("long reading", &settings, Priority::Normal).unwrap();
    let playing = ctx.tts.id_of("long reading").unwrap();
    assert!(wait(|| ctx.output.current() == Some(playing)));

    queue.enqueue("queued one", &settings, Priority::Normal).unwrap();
    queue.enqueue("queued two", &settings, Priority::Normal).unwrap();
    queue.enqueue("interruption", &settings, Priority::Interrupt).unwrap();

    let interruption = ctx.tts.id_of("interruption").unwrap();
    assert!(wait(|| ctx.output.current() == Some(interruption)));
    assert!(wait(|| ctx.tts.is_released(playing)));

    let skipped = [
        ctx.tts.id_of("queued one").unwrap(),
        ctx.tts.id_of("queued two").unwrap(),
    ];
    for id in skipped {
        assert!(ctx.tts.is_released(id));
        assert_eq!(ctx.output.play_count(id), 0);
    }
    assert!(ctx.output.stops() >= 1);
    assert!(!ctx.tts.is_released(interruption));
}

#[test]
fn test_pause_freezes_worker_until_resume() {
    let ctx = TestContext::new(Duration::from_millis(300));
    let queue = ctx.queue();
    let settings = Settings::default();

    queue.enqueue("first", &settings, Priority::Normal).unwrap();
    queue.enqueue("second", &settings, Priority::Normal).unwrap();
    let first = ctx.tts.id_of("first").unwrap();
    assert!(wait(|| ctx.output.current() == Some(first)));

    queue.pause();
    assert!(ctx.output.is_paused());
    std::thread::sleep(Duration::from_millis(500));

    assert_eq!(ctx.output.played(), vec![first]);
    assert!(ctx.tts.released().is_empty());
    assert_eq!(queue.pending_len(), 1);

    queue.resume();
    assert!(!ctx.output.is_paused());
    assert!(wait(|| ctx.tts.released().len() == 2));
    assert_eq!(ctx.output.played(), ctx.tts.created_ids());
}

#[test]
fn test_every_artifact_released_exactly_once() {
    let ctx = TestContext::new(Duration::from_millis(10));
    let mut queue = ctx.queue();
    let settings = Settings::default();

    for round in 0..5 {
        for i in 0..4 {
            let text = format!("round {} item {}", round, i);
            queue.enqueue(&text, &settings, Priority::Normal).unwrap();
        }
        let text = format!("round {} interrupt", round);
        queue.enqueue(&text, &settings, Priority::Interrupt).unwrap();
        if round % 2 == 0 {
            queue.stop_all();
        }
        queue.enqueue("tail", &settings, Priority::Normal).unwrap();
    }
    queue.shutdown();

    let mut created = ctx.tts.created_ids();
    let mut released = ctx.tts.released();
    created.sort();
    released.sort();
    assert_eq!(created.len(), 30);
    assert_eq!(released, created);
}

#[test]
fn test_play_error_skips_to_next() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();
    let settings = Settings::default();

    ctx.output.fail_plays(1);
    queue.enqueue("broken", &settings, Priority::Normal).unwrap();
    queue.enqueue("fine", &settings, Priority::Normal).unwrap();

    assert!(wait(|| ctx.tts.released().len() == 2));
    let fine = ctx.tts.id_of("fine").unwrap();
    assert_eq!(ctx.output.played(), vec![fine]);
}

#[test]
fn test_release_is_retried_once() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();

    ctx.tts.fail_releases(1);
    queue
        .enqueue("hello", &Settings::default(), Priority::Normal)
        .unwrap();
    let id = ctx.tts.id_of("hello").unwrap();

    assert!(wait(|| ctx.tts.is_released(id)));
    assert_eq!(ctx.tts.release_attempts(), 2);
}

#[test]
fn test_release_abandoned_after_second_failure() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();
    let settings = Settings::default();

    ctx.tts.fail_releases(2);
    queue.enqueue("stuck", &settings, Priority::Normal).unwrap();
    assert!(wait(|| ctx.tts.release_attempts() == 2));

    // The worker moves on
    queue.enqueue("next", &settings, Priority::Normal).unwrap();
    let next = ctx.tts.id_of("next").unwrap();
    assert!(wait(|| ctx.tts.is_released(next)));

    let stuck = ctx.tts.id_of("stuck").unwrap();
    assert!(!ctx.tts.is_released(stuck));
    assert_eq!(ctx.tts.release_attempts(), 3);
}

#[test]
fn test_synthesis_failure_is_reported() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();

    ctx.tts.set_failing(true);
    let result = queue.enqueue("nothing", &Settings::default(), Priority::Normal);

    assert!(result.is_err());
    assert_eq!(queue.pending_len(), 0);
}

#[test]
fn test_shutdown_releases_pending_and_rejects_new_work() {
    let ctx = TestContext::new(LONG);
    let mut queue = ctx.queue();
    let settings = Settings::default();

    queue.enqueue("playing", &settings, Priority::Normal).unwrap();
    let playing = ctx.tts.id_of("playing").unwrap();
    assert!(wait(|| ctx.output.current() == Some(playing)));
    queue.enqueue("waiting", &settings, Priority::Normal).unwrap();
    queue.enqueue("also waiting", &settings, Priority::Normal).unwrap();

    queue.shutdown();
    assert_eq!(ctx.tts.released().len(), 3);
    assert_eq!(queue.pending_len(), 0);

    assert!(queue.enqueue("late", &settings, Priority::Normal).is_err());
    let late = ctx.tts.id_of("late").unwrap();
    assert!(ctx.tts.is_released(late));

    // Idempotent
    queue.shutdown();
    assert_eq!(ctx.tts.released().len(), 4);
}

#[test]
fn test_settings_are_copied_at_enqueue() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();

    let mut settings = Settings {
        volume: 0.4,
        ..Settings::default()
    };
    queue.enqueue("quiet words", &settings, Priority::Normal).unwrap();
    settings.volume = 0.9;

    assert!(wait(|| ctx.tts.released().len() == 1));
    assert_eq!(ctx.output.last_volume(), Some(0.4));
    assert_eq!(ctx.tts.last().unwrap().settings.volume, 0.4);
}

#[test]
fn test_loop_replays_until_something_else_is_queued() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();
    let looping = Settings {
        loop_enabled: true,
        ..Settings::default()
    };

    queue.enqueue("verse", &looping, Priority::Interrupt).unwrap();
    let verse = ctx.tts.id_of("verse").unwrap();
    assert!(wait(|| ctx.output.play_count(verse) >= 3));
    assert!(!ctx.tts.is_released(verse));

    queue
        .enqueue("something else", &Settings::default(), Priority::Normal)
        .unwrap();
    let other = ctx.tts.id_of("something else").unwrap();
    assert!(wait(|| ctx.tts.is_released(other)));
    assert!(ctx.tts.is_released(verse));
}

#[test]
fn test_loop_flag_ignored_for_feedback() {
    let ctx = TestContext::new(SHORT);
    let queue = ctx.queue();
    let looping = Settings {
        loop_enabled: true,
        ..Settings::default()
    };

    queue.enqueue("Loop mode turned on", &looping, Priority::Normal).unwrap();
    let ack = ctx.tts.id_of("Loop mode").unwrap();
    assert!(wait(|| ctx.tts.is_released(ack)));
    assert_eq!(ctx.output.play_count(ack), 1);
}

#[test]
fn test_cancel_removes_one_queued_request() {
    let ctx = TestContext::new(LONG);
    let queue = ctx.queue();
    let settings = Settings::default();

    queue.pause();
    let keep = queue.enqueue("keep", &settings, Priority::Normal).unwrap();
    let unwanted = queue.enqueue("unwanted", &settings, Priority::Normal).unwrap();

    assert!(queue.cancel(unwanted));
    assert!(!queue.cancel(unwanted));
    let artifact = ctx.tts.id_of("unwanted").unwrap();
    assert!(ctx.tts.is_released(artifact));
    assert_eq!(ctx.output.play_count(artifact), 0);

    let pending = queue.snapshot();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, keep);
}

//! End-to-end session lifecycle through the engine
//!
//! Drives the engine the way the headless runner does: messages in, events
//! out, with tokio's paused clock standing in for real time.

use std::time::Duration;

use apidemo_app::config::Settings;
use apidemo_app::{Engine, EngineEvent, Message};
use apidemo_core::StopReason;

fn settings(limit: u32) -> Settings {
    let mut settings = Settings::default();
    settings.worker.limit = limit;
    settings.worker.tick_ms = 10;
    settings.worker.wait_timeout_ms = 100;
    settings.notifier.rounds = 2;
    settings.notifier.interval_ms = 50;
    settings
}

fn engine(limit: u32) -> Engine {
    Engine::with_settings(std::env::temp_dir(), settings(limit))
}

/// Let background tasks run for `ms`, then process everything they posted
async fn run_for(engine: &mut Engine, ms: u64) -> Vec<EngineEvent> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    while let Ok(msg) = engine.msg_rx.try_recv() {
        engine.process_message(msg);
    }
    engine.drain_events()
}

fn progress_positions(events: &[EngineEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Progress { position, .. } => Some(*position),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_progress_survives_repeated_rotation() {
    let mut engine = engine(100);
    engine.start().unwrap();

    let mut last_seen = 0;
    for _ in 0..4 {
        let events = run_for(&mut engine, 45).await;
        let positions = progress_positions(&events);
        assert!(!positions.is_empty());
        // Never goes backwards across a rotation
        assert!(positions[0] > last_seen);
        last_seen = *positions.last().unwrap();

        engine.process_message(Message::ConfigurationChange);
        let events = engine.drain_events();
        match events.as_slice() {
            [EngineEvent::ObserverDetached { .. }, EngineEvent::SessionReattached { position, .. }] => {
                assert!(*position >= last_seen);
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    assert_eq!(engine.state.workers.len(), 1);
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_run_to_limit_then_restart() {
    let mut engine = engine(10);
    engine.start().unwrap();

    let events = run_for(&mut engine, 1_000).await;
    assert_eq!(progress_positions(&events), (1..=10).collect::<Vec<_>>());

    engine.process_message(Message::Restart);
    let events = run_for(&mut engine, 1_000).await;
    let positions = progress_positions(&events);
    // The reset to 0 may be coalesced with the first increment
    assert!(positions[0] <= 1, "positions {:?}", positions);
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(positions.last(), Some(&10));

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_screen_catches_up_after_flooding_the_channel() {
    let mut settings = settings(1_000);
    settings.worker.tick_ms = 1;
    let mut engine = Engine::with_settings(std::env::temp_dir(), settings);
    engine.start().unwrap();

    // Nobody drains the host channel while the worker runs to its limit
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(engine.state.screen.as_ref().unwrap().snapshot().position, 1_000);

    for _ in 0..5 {
        run_for(&mut engine, 50).await;
    }

    let screen = engine.state.screen.as_ref().unwrap();
    assert_eq!(screen.bar().unwrap().value(), screen.snapshot().position);
    assert_eq!(screen.bar().unwrap().value(), 1_000);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_finish_ends_worker_for_good() {
    let mut engine = engine(100);
    engine.start().unwrap();
    run_for(&mut engine, 30).await;

    let worker = engine
        .state
        .workers
        .get(&engine.state.session_key)
        .cloned()
        .unwrap();

    engine.process_message(Message::Finish);
    assert!(engine.should_quit());
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, EngineEvent::SessionEnded { .. })));

    engine.shutdown().await;
    assert!(worker.is_finished());

    let stopped_at = worker.snapshot().position;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(worker.snapshot().position, stopped_at);
}

#[tokio::test(start_paused = true)]
async fn test_notifying_service_alongside_worker() {
    let mut engine = engine(5);
    engine.start().unwrap();
    engine.process_message(Message::StartNotifying);
    // Second start while running is ignored
    engine.process_message(Message::StartNotifying);

    let events = run_for(&mut engine, 1_000).await;

    let started = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::ServiceStarted { .. }))
        .count();
    let notifications = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::Notification { .. }))
        .count();
    assert_eq!(started, 1);
    assert_eq!(notifications, 6);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::ServiceStopped {
            reason: StopReason::Completed,
            ..
        }
    )));
    assert_eq!(progress_positions(&events).last(), Some(&5));

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_notifying_cancels() {
    let mut engine = engine(5);
    engine.process_message(Message::StartNotifying);
    run_for(&mut engine, 10).await;

    engine.process_message(Message::StopNotifying);
    let events = run_for(&mut engine, 10).await;

    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::ServiceStopped {
            reason: StopReason::Cancelled,
            ..
        }
    )));
    assert!(engine.state.services.is_empty());
}

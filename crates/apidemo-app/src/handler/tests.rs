//! Tests for the update function

use std::time::Duration;

use tokio::sync::mpsc;

use apidemo_core::{Mood, ProgressUpdate, SessionKey, StopReason};

use super::*;
use crate::config::NotifierSettings;
use crate::engine_event::EngineEvent;
use crate::host::ProgressScreen;
use crate::notifying::{NotifyingService, NOTIFYING_SERVICE_KEY};
use crate::state::AppState;
use crate::worker::{WorkerConfig, WorkerTiming};

fn key() -> SessionKey {
    SessionKey::new("retained-progress")
}

fn config() -> WorkerConfig {
    WorkerConfig {
        limit: 10,
        timing: WorkerTiming {
            tick: Duration::from_millis(10),
            wait_timeout: Duration::from_millis(100),
        },
    }
}

fn state_with_screen(msg_tx: mpsc::Sender<Message>) -> AppState {
    let mut state = AppState::new(key());
    let (screen, _) = ProgressScreen::on_create(&mut state.workers, key(), config(), msg_tx).unwrap();
    state.screen = Some(screen);
    state
}

#[test]
fn test_quit_sets_quitting_phase() {
    let mut state = AppState::new(key());
    update(&mut state, Message::Quit);
    assert!(state.should_quit());
}

#[test]
fn test_configuration_change_requests_recreate() {
    let mut state = AppState::new(key());
    let result = update(&mut state, Message::ConfigurationChange);
    assert_eq!(result.action, Some(UpdateAction::RecreateScreen));
}

#[test]
fn test_finish_requests_end_session() {
    let mut state = AppState::new(key());
    let result = update(&mut state, Message::Finish);
    assert_eq!(result.action, Some(UpdateAction::EndSession));
}

#[test]
fn test_restart_without_screen_reports_error() {
    let mut state = AppState::new(key());
    update(&mut state, Message::Restart);

    let events = state.drain_events();
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::Error { fatal: false, .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_progress_for_current_attachment_is_rendered() {
    let (tx, mut rx) = mpsc::channel(64);
    let mut state = state_with_screen(tx);

    tokio::time::sleep(Duration::from_millis(25)).await;
    while let Ok(msg) = rx.try_recv() {
        update(&mut state, msg);
    }

    let events = state.drain_events();
    assert!(!events.is_empty());
    assert!(events
        .iter()
        .all(|e| matches!(e, EngineEvent::Progress { .. })));
    let bar = state.screen.as_ref().unwrap().bar().unwrap();
    assert!(bar.value() > 0);
}

#[tokio::test(start_paused = true)]
async fn test_progress_for_stale_token_is_dropped() {
    let (tx, _rx) = mpsc::channel(64);
    let mut state = state_with_screen(tx);
    let stale = state.screen.as_ref().unwrap().token() + 1_000;

    update(
        &mut state,
        Message::Progress {
            key: key(),
            token: stale,
            update: ProgressUpdate {
                position: 5,
                limit: 10,
            },
        },
    );

    assert!(state.drain_events().is_empty());
    assert_eq!(state.screen.as_ref().unwrap().bar().unwrap().value(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_and_set_limit_reach_worker() {
    let (tx, _rx) = mpsc::channel(64);
    let mut state = state_with_screen(tx);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(state.screen.as_ref().unwrap().snapshot().position, 10);

    update(&mut state, Message::Restart);
    assert_eq!(state.screen.as_ref().unwrap().snapshot().position, 0);

    update(&mut state, Message::SetLimit(3));
    assert_eq!(state.screen.as_ref().unwrap().snapshot().limit, 3);

    let events = state.drain_events();
    assert_eq!(
        events,
        vec![
            EngineEvent::Restarted { key: key() },
            EngineEvent::LimitChanged {
                key: key(),
                limit: 3
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_snapshot() {
    let (tx, _rx) = mpsc::channel(64);
    let mut state = state_with_screen(tx);

    update(&mut state, Message::Status);

    match state.drain_events().as_slice() {
        [EngineEvent::Status { key: k, snapshot }] => {
            assert_eq!(k, &key());
            assert!(snapshot.ready);
            assert_eq!(snapshot.limit, 10);
        }
        other => panic!("unexpected events: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_notifying_is_noop_while_running() {
    let (tx, _rx) = mpsc::channel(64);
    let mut state = AppState::new(key());
    let service_key = SessionKey::new(NOTIFYING_SERVICE_KEY);

    let result = update(&mut state, Message::StartNotifying);
    assert_eq!(result.action, Some(UpdateAction::StartNotifying));

    let service =
        NotifyingService::spawn(service_key.clone(), &NotifierSettings::default(), tx).unwrap();
    state.services.insert(service_key, service).unwrap();

    let result = update(&mut state, Message::StartNotifying);
    assert_eq!(result.action, None);
}

#[tokio::test(start_paused = true)]
async fn test_stale_stop_report_keeps_current_service() {
    let (tx, _rx) = mpsc::channel(64);
    let mut state = AppState::new(key());
    let service_key = SessionKey::new(NOTIFYING_SERVICE_KEY);
    let service =
        NotifyingService::spawn(service_key.clone(), &NotifierSettings::default(), tx).unwrap();
    let current_run = service.run();
    state.services.insert(service_key.clone(), service).unwrap();

    update(
        &mut state,
        Message::NotifyingStopped {
            service: service_key.clone(),
            run: current_run + 1_000,
            reason: StopReason::Completed,
        },
    );
    assert!(state.services.contains(&service_key));

    update(
        &mut state,
        Message::NotifyingStopped {
            service: service_key.clone(),
            run: current_run,
            reason: StopReason::Cancelled,
        },
    );
    assert!(!state.services.contains(&service_key));
}

#[test]
fn test_notification_becomes_event() {
    let mut state = AppState::new(key());
    let service = SessionKey::new(NOTIFYING_SERVICE_KEY);

    update(
        &mut state,
        Message::Notification {
            service: service.clone(),
            round: 2,
            mood: Mood::Sad,
        },
    );

    assert_eq!(
        state.drain_events(),
        vec![EngineEvent::Notification {
            service,
            round: 2,
            mood: Mood::Sad,
        }]
    );
}

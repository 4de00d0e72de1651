//! Main update function - handles state transitions (TEA pattern)

use apidemo_core::prelude::*;
use apidemo_core::SessionKey;

use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::notifying::NOTIFYING_SERVICE_KEY;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Quit => {
            state.request_quit();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Screen controls
        // ─────────────────────────────────────────────────────────
        Message::Restart => {
            let Some(screen) = state.screen.as_ref() else {
                state.push_error(&Error::session_not_found(state.session_key.as_str()));
                return UpdateResult::none();
            };
            screen.restart();
            let key = screen.key().clone();
            state.push_event(EngineEvent::Restarted { key });
            UpdateResult::none()
        }

        Message::SetLimit(limit) => {
            let Some(screen) = state.screen.as_ref() else {
                state.push_error(&Error::session_not_found(state.session_key.as_str()));
                return UpdateResult::none();
            };
            screen.set_limit(limit);
            let key = screen.key().clone();
            state.push_event(EngineEvent::LimitChanged { key, limit });
            UpdateResult::none()
        }

        Message::Status => {
            match state.screen.as_ref() {
                Some(screen) => {
                    let event = EngineEvent::Status {
                        key: screen.key().clone(),
                        snapshot: screen.snapshot(),
                    };
                    state.push_event(event);
                }
                None => {
                    state.push_error(&Error::session_not_found(state.session_key.as_str()));
                }
            }
            UpdateResult::none()
        }

        Message::ConfigurationChange => UpdateResult::action(UpdateAction::RecreateScreen),

        Message::Finish => UpdateResult::action(UpdateAction::EndSession),

        Message::Progress { key, token, update } => {
            let Some(screen) = state.screen.as_mut() else {
                trace!("No screen, dropping progress for '{}'", key);
                return UpdateResult::none();
            };
            if screen.key() != &key || !screen.apply_progress(token, update) {
                return UpdateResult::none();
            }
            let bar = screen.bar().map(|b| b.render()).unwrap_or_default();
            state.push_event(EngineEvent::Progress {
                key,
                position: update.position,
                limit: update.limit,
                bar,
            });
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Notifying service
        // ─────────────────────────────────────────────────────────
        Message::StartNotifying => {
            let key = SessionKey::new(NOTIFYING_SERVICE_KEY);
            match state.services.get(&key) {
                Some(service) if !service.is_finished() => {
                    info!("Notifying service '{}' is already running", key);
                    UpdateResult::none()
                }
                _ => UpdateResult::action(UpdateAction::StartNotifying),
            }
        }

        Message::StopNotifying => {
            let key = SessionKey::new(NOTIFYING_SERVICE_KEY);
            match state.services.get(&key) {
                Some(service) => service.stop(),
                None => debug!("Notifying service '{}' is not running", key),
            }
            UpdateResult::none()
        }

        Message::Notification {
            service,
            round,
            mood,
        } => {
            state.push_event(EngineEvent::Notification {
                service,
                round,
                mood,
            });
            UpdateResult::none()
        }

        Message::NotifyingStopped {
            service,
            run,
            reason,
        } => {
            let current = state.services.get(&service).map(|s| s.run());
            if current == Some(run) {
                state.services.remove(&service);
            } else {
                debug!(
                    "Stop report from run {} of '{}' (current run {:?})",
                    run, service, current
                );
            }
            state.push_event(EngineEvent::ServiceStopped { service, reason });
            UpdateResult::none()
        }
    }
}

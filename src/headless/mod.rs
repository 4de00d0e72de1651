//! Headless mode - JSON event output
//!
//! The host has no TUI: every [`EngineEvent`] is rendered as one line of NDJSON
//! on stdout, which keeps the output scriptable.
//!
//! # Event Format
//!
//! Each event has an "event" field indicating its type, along with
//! event-specific data and a millisecond timestamp.
//!
//! # Example Output
//!
//! ```json
//! {"event":"session_created","session":"retained-progress","observer":1,"limit":500,"timestamp":1704700001000}
//! {"event":"progress","session":"retained-progress","position":1,"limit":500,"bar":"[....] 1/500","timestamp":1704700001001}
//! {"event":"observer_detached","session":"retained-progress","observer":1,"timestamp":1704700002000}
//! ```

pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use apidemo_app::EngineEvent;
use apidemo_core::{Mood, StopReason};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    SessionCreated {
        session: String,
        observer: u64,
        limit: u32,
        timestamp: i64,
    },

    SessionReattached {
        session: String,
        observer: u64,
        position: u32,
        limit: u32,
        timestamp: i64,
    },

    ObserverDetached {
        session: String,
        observer: u64,
        timestamp: i64,
    },

    Progress {
        session: String,
        position: u32,
        limit: u32,
        bar: String,
        timestamp: i64,
    },

    Restarted {
        session: String,
        timestamp: i64,
    },

    LimitChanged {
        session: String,
        limit: u32,
        timestamp: i64,
    },

    ServiceStarted {
        service: String,
        timestamp: i64,
    },

    Notification {
        service: String,
        round: u32,
        mood: Mood,
        message: String,
        timestamp: i64,
    },

    ServiceStopped {
        service: String,
        reason: StopReason,
        timestamp: i64,
    },

    Status {
        session: String,
        position: u32,
        limit: u32,
        ready: bool,
        quitting: bool,
        running: bool,
        timestamp: i64,
    },

    SessionEnded {
        session: String,
        position: u32,
        timestamp: i64,
    },

    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // Write to stdout with newline (NDJSON format)
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        // Flush to ensure immediate output
        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<EngineEvent> for HeadlessEvent {
    fn from(event: EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::SessionCreated { key, token, limit } => Self::SessionCreated {
                session: key.to_string(),
                observer: token,
                limit,
                timestamp,
            },
            EngineEvent::SessionReattached {
                key,
                token,
                position,
                limit,
            } => Self::SessionReattached {
                session: key.to_string(),
                observer: token,
                position,
                limit,
                timestamp,
            },
            EngineEvent::ObserverDetached { key, token } => Self::ObserverDetached {
                session: key.to_string(),
                observer: token,
                timestamp,
            },
            EngineEvent::Progress {
                key,
                position,
                limit,
                bar,
            } => Self::Progress {
                session: key.to_string(),
                position,
                limit,
                bar,
                timestamp,
            },
            EngineEvent::Restarted { key } => Self::Restarted {
                session: key.to_string(),
                timestamp,
            },
            EngineEvent::LimitChanged { key, limit } => Self::LimitChanged {
                session: key.to_string(),
                limit,
                timestamp,
            },
            EngineEvent::ServiceStarted { service } => Self::ServiceStarted {
                service: service.to_string(),
                timestamp,
            },
            EngineEvent::Notification {
                service,
                round,
                mood,
            } => Self::Notification {
                service: service.to_string(),
                round,
                mood,
                message: mood.message().to_string(),
                timestamp,
            },
            EngineEvent::ServiceStopped { service, reason } => Self::ServiceStopped {
                service: service.to_string(),
                reason,
                timestamp,
            },
            EngineEvent::Status { key, snapshot } => Self::Status {
                session: key.to_string(),
                position: snapshot.position,
                limit: snapshot.limit,
                ready: snapshot.ready,
                quitting: snapshot.quitting,
                running: snapshot.running,
                timestamp,
            },
            EngineEvent::SessionEnded { key, position } => Self::SessionEnded {
                session: key.to_string(),
                position,
                timestamp,
            },
            EngineEvent::Error { message, fatal } => Self::Error {
                message,
                fatal,
                timestamp,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidemo_core::{SessionKey, WorkerSnapshot};

    fn to_json(event: EngineEvent) -> serde_json::Value {
        serde_json::to_value(HeadlessEvent::from(event)).unwrap()
    }

    #[test]
    fn test_progress_event_shape() {
        let json = to_json(EngineEvent::Progress {
            key: SessionKey::new("s"),
            position: 3,
            limit: 10,
            bar: "[###] 3/10".to_string(),
        });

        assert_eq!(json["event"], "progress");
        assert_eq!(json["session"], "s");
        assert_eq!(json["position"], 3);
        assert_eq!(json["limit"], 10);
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn test_notification_event_carries_mood_text() {
        let json = to_json(EngineEvent::Notification {
            service: SessionKey::new("notifying-service"),
            round: 1,
            mood: Mood::Neutral,
        });

        assert_eq!(json["event"], "notification");
        assert_eq!(json["mood"], "neutral");
        assert_eq!(json["message"], Mood::Neutral.message());
    }

    #[test]
    fn test_status_event_flattens_snapshot() {
        let json = to_json(EngineEvent::Status {
            key: SessionKey::new("s"),
            snapshot: WorkerSnapshot {
                position: 4,
                limit: 8,
                ready: true,
                quitting: false,
                running: true,
            },
        });

        assert_eq!(json["event"], "status");
        assert_eq!(json["ready"], true);
        assert_eq!(json["position"], 4);
    }

    #[test]
    fn test_service_stopped_reason_is_lowercase() {
        let json = to_json(EngineEvent::ServiceStopped {
            service: SessionKey::new("notifying-service"),
            reason: StopReason::Cancelled,
        });

        assert_eq!(json["event"], "service_stopped");
        assert_eq!(json["reason"], "cancelled");
    }
}

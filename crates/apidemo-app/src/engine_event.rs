//! Events the engine reports to its frontend
//!
//! The update function records what changed as `EngineEvent`s; the frontend
//! (the headless runner) drains and renders them.

use apidemo_core::{Mood, ObserverToken, SessionKey, StopReason, WorkerSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A new worker was started for the session
    SessionCreated {
        key: SessionKey,
        token: ObserverToken,
        limit: u32,
    },
    /// A recreated screen found the session's worker and reattached
    SessionReattached {
        key: SessionKey,
        token: ObserverToken,
        position: u32,
        limit: u32,
    },
    /// A screen was torn down for a configuration change
    ObserverDetached {
        key: SessionKey,
        token: ObserverToken,
    },
    /// The current screen rendered new progress
    Progress {
        key: SessionKey,
        position: u32,
        limit: u32,
        bar: String,
    },
    Restarted {
        key: SessionKey,
    },
    LimitChanged {
        key: SessionKey,
        limit: u32,
    },
    ServiceStarted {
        service: SessionKey,
    },
    Notification {
        service: SessionKey,
        round: u32,
        mood: Mood,
    },
    ServiceStopped {
        service: SessionKey,
        reason: StopReason,
    },
    Status {
        key: SessionKey,
        snapshot: WorkerSnapshot,
    },
    /// The session's worker was shut down and unregistered
    SessionEnded {
        key: SessionKey,
        position: u32,
    },
    Error {
        message: String,
        fatal: bool,
    },
}

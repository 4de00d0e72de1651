//! Message types for the application (TEA pattern)

use apidemo_core::{Mood, ObserverToken, ProgressUpdate, SessionKey, StopReason};

use crate::notifying::ServiceRun;

/// All possible messages/actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Controls
    // ─────────────────────────────────────────────────────────
    /// Reset the retained worker's position to 0
    Restart,
    /// Change the retained worker's limit
    SetLimit(u32),
    /// Tear the screen down and recreate it, keeping the worker
    ConfigurationChange,
    /// Tear the screen down for good, ending the session
    Finish,
    /// Start the notifying service (no-op if it is running)
    StartNotifying,
    /// Ask the notifying service to stop early
    StopNotifying,
    /// Report the worker state
    Status,

    // ─────────────────────────────────────────────────────────
    // Background → host
    // ─────────────────────────────────────────────────────────
    /// Progress marshaled from a worker to the attachment identified by `token`
    Progress {
        key: SessionKey,
        token: ObserverToken,
        update: ProgressUpdate,
    },
    /// The notifying service posted a notification
    Notification {
        service: SessionKey,
        round: u32,
        mood: Mood,
    },
    /// The notifying service task has exited
    NotifyingStopped {
        service: SessionKey,
        run: ServiceRun,
        reason: StopReason,
    },

    /// Exit the host loop
    Quit,
}

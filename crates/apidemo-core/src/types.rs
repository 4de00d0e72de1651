//! Domain types shared by the worker, host, and headless runner

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Stable identifier used to look up a retained component across observer
/// recreation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Identifies one attachment of one observer instance
pub type ObserverToken = u64;

static OBSERVER_TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique observer token
pub fn next_observer_token() -> ObserverToken {
    OBSERVER_TOKEN_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Progress published by a worker to its attached observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub position: u32,
    pub limit: u32,
}

/// Point-in-time view of a worker's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub position: u32,
    pub limit: u32,
    /// An observer is attached
    pub ready: bool,
    /// Shutdown has been requested
    pub quitting: bool,
    /// The loop task has been started and has not exited yet
    pub running: bool,
}

/// Payload of a status notification, cycled in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Happy, Mood::Neutral, Mood::Sad];

    pub fn message(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy: all work is done",
            Mood::Neutral => "Neutral: still working",
            Mood::Sad => "Sad: waiting on a result",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Happy => write!(f, "happy"),
            Mood::Neutral => write!(f, "neutral"),
            Mood::Sad => write!(f, "sad"),
        }
    }
}

/// Why a single-shot service stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// Ran all of its rounds and stopped itself
    Completed,
    /// Stopped on request before finishing
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "completed"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Host lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_tokens_are_unique() {
        let a = next_observer_token();
        let b = next_observer_token();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_session_key_serializes_as_string() {
        let key = SessionKey::new("retained-progress");
        assert_eq!(
            serde_json::to_string(&key).unwrap(),
            "\"retained-progress\""
        );
        assert_eq!(key.to_string(), "retained-progress");
    }

    #[test]
    fn test_mood_cycle_order() {
        assert_eq!(Mood::ALL, [Mood::Happy, Mood::Neutral, Mood::Sad]);
        assert_eq!(Mood::Sad.to_string(), "sad");
    }
}

//! Host state owned by the engine

use apidemo_core::prelude::*;
use apidemo_core::{AppPhase, SessionKey};

use crate::engine_event::EngineEvent;
use crate::host::ProgressScreen;
use crate::notifying::NotifyingService;
use crate::registry::Registry;
use crate::worker::RetainedWorker;

#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,

    /// Key the progress worker is retained under
    pub session_key: SessionKey,

    /// Retained workers, outliving any screen
    pub workers: Registry<RetainedWorker>,

    /// Running single-shot services
    pub services: Registry<NotifyingService>,

    /// The current screen. `None` between teardown and recreation, and after
    /// the session finished.
    pub screen: Option<ProgressScreen>,

    events: Vec<EngineEvent>,
}

impl AppState {
    pub fn new(session_key: SessionKey) -> Self {
        Self {
            phase: AppPhase::Running,
            session_key,
            workers: Registry::new(),
            services: Registry::new(),
            screen: None,
            events: Vec::new(),
        }
    }

    pub fn push_event(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    /// Report a non-fatal problem to the frontend
    pub fn push_error(&mut self, err: &Error) {
        warn!("{}", err);
        self.events.push(EngineEvent::Error {
            message: err.to_string(),
            fatal: err.is_fatal(),
        });
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn request_quit(&mut self) {
        self.phase = AppPhase::Quitting;
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }
}

//! Engine - owns the host state and message channel, executes actions
//!
//! Frontends create an `Engine`, call [`Engine::start`] to create the first
//! screen, feed it messages from [`Engine::msg_rx`], render the drained
//! [`EngineEvent`]s, and finally call [`Engine::shutdown`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;

use apidemo_core::prelude::*;
use apidemo_core::SessionKey;

use crate::config::{load_settings, Settings};
use crate::engine_event::EngineEvent;
use crate::handler::{update, UpdateAction};
use crate::host::{AttachKind, ProgressScreen, Teardown};
use crate::message::Message;
use crate::notifying::{NotifyingService, NOTIFYING_SERVICE_KEY};
use crate::state::AppState;
use crate::worker::RetainedWorker;

/// Capacity of the host message channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Upper bound on waiting for one background task at shutdown
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Engine {
    pub state: AppState,
    pub settings: Settings,
    pub project_path: PathBuf,
    pub msg_tx: mpsc::Sender<Message>,
    pub msg_rx: mpsc::Receiver<Message>,

    /// Workers whose session ended, awaiting a join at shutdown
    retired: Vec<RetainedWorker>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("project_path", &self.project_path)
            .field("retired", &self.retired.len())
            .finish()
    }
}

impl Engine {
    /// Create an engine with settings loaded from `project_path`
    pub fn new(project_path: PathBuf) -> Self {
        let settings = load_settings(&project_path);
        Self::with_settings(project_path, settings)
    }

    pub fn with_settings(project_path: PathBuf, settings: Settings) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        Self {
            state: AppState::new(settings.session_key()),
            settings,
            project_path,
            msg_tx,
            msg_rx,
            retired: Vec::new(),
        }
    }

    /// Create the first screen
    pub fn start(&mut self) -> Result<()> {
        self.create_screen()
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.state.drain_events()
    }

    /// Run a message and its follow-ups through the update function
    pub fn process_message(&mut self, msg: Message) {
        let mut next = Some(msg);
        while let Some(msg) = next.take() {
            let result = update(&mut self.state, msg);
            if let Some(action) = result.action {
                self.handle_action(action);
            }
            next = result.message;
        }
    }

    fn handle_action(&mut self, action: UpdateAction) {
        match action {
            UpdateAction::RecreateScreen => {
                self.destroy_screen(Teardown::ConfigurationChange);
                if let Err(e) = self.create_screen() {
                    self.state.push_error(&e);
                }
            }
            UpdateAction::EndSession => {
                self.destroy_screen(Teardown::Finishing);
                self.state.request_quit();
            }
            UpdateAction::StartNotifying => self.start_notifying(),
        }
    }

    fn create_screen(&mut self) -> Result<()> {
        let key = self.state.session_key.clone();
        let (screen, kind) = ProgressScreen::on_create(
            &mut self.state.workers,
            key.clone(),
            self.settings.worker_config(),
            self.msg_tx.clone(),
        )
        .with_context(|| format!("Failed to create screen for '{}'", key))?;

        let snapshot = screen.snapshot();
        let event = match kind {
            AttachKind::Created => EngineEvent::SessionCreated {
                key,
                token: screen.token(),
                limit: snapshot.limit,
            },
            AttachKind::Reattached => EngineEvent::SessionReattached {
                key,
                token: screen.token(),
                position: snapshot.position,
                limit: snapshot.limit,
            },
        };
        self.state.screen = Some(screen);
        self.state.push_event(event);
        Ok(())
    }

    fn destroy_screen(&mut self, teardown: Teardown) {
        let Some(screen) = self.state.screen.take() else {
            debug!("No screen to tear down ({:?})", teardown);
            return;
        };

        let key = screen.key().clone();
        let token = screen.token();
        match screen.on_destroy(teardown, &mut self.state.workers) {
            Some(worker) => {
                let position = worker.snapshot().position;
                self.retired.push(worker);
                self.state
                    .push_event(EngineEvent::SessionEnded { key, position });
            }
            None => {
                self.state
                    .push_event(EngineEvent::ObserverDetached { key, token });
            }
        }
    }

    fn start_notifying(&mut self) {
        let key = SessionKey::new(NOTIFYING_SERVICE_KEY);
        let notifier = &self.settings.notifier;
        let started = NotifyingService::spawn(key.clone(), notifier, self.msg_tx.clone())
            // A rejected service is dropped, which closes its stop channel
            .and_then(|service| self.state.services.replace(key.clone(), service));
        match started {
            Ok(previous) => {
                if let Some(previous) = previous {
                    previous.stop();
                }
                self.state
                    .push_event(EngineEvent::ServiceStarted { service: key });
            }
            Err(e) => self.state.push_error(&e),
        }
    }

    /// Permanently end everything: the open screen finishes its session, every
    /// service is stopped, and every worker is shut down and joined.
    pub async fn shutdown(&mut self) {
        info!("Engine shutting down");
        self.destroy_screen(Teardown::Finishing);

        let services = self.state.services.drain();
        for (_, service) in &services {
            service.stop();
        }

        for (key, worker) in self.state.workers.drain() {
            debug!("Shutting down orphaned worker '{}'", key);
            worker.shutdown();
            self.retired.push(worker);
        }

        // Stop reports from services are no longer interesting
        self.msg_rx.close();

        for worker in self.retired.drain(..) {
            if tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, worker.join())
                .await
                .is_err()
            {
                warn!("Worker did not exit within {:?}", SHUTDOWN_JOIN_TIMEOUT);
            }
        }

        for (key, service) in services {
            if tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, service.join())
                .await
                .is_err()
            {
                warn!(
                    "Notifying service '{}' did not exit within {:?}",
                    key, SHUTDOWN_JOIN_TIMEOUT
                );
            }
        }

        self.state.request_quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.worker.limit = 10;
        settings.worker.tick_ms = 10;
        settings.worker.wait_timeout_ms = 100;
        settings.notifier.rounds = 1;
        settings.notifier.interval_ms = 100;
        settings
    }

    fn create_test_engine() -> Engine {
        let dir = tempfile::tempdir().unwrap();
        Engine::with_settings(dir.path().to_path_buf(), test_settings())
    }

    async fn pump(engine: &mut Engine, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        while let Ok(msg) = engine.msg_rx.try_recv() {
            engine.process_message(msg);
        }
    }

    #[test]
    fn test_new_loads_settings_from_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".apidemo")).unwrap();
        std::fs::write(
            dir.path().join(".apidemo/config.toml"),
            "[session]\nkey = \"from-file\"\n",
        )
        .unwrap();

        let engine = Engine::new(dir.path().to_path_buf());
        assert_eq!(engine.state.session_key, SessionKey::new("from-file"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_creates_session() {
        let mut engine = create_test_engine();
        engine.start().unwrap();

        let events = engine.drain_events();
        assert!(matches!(
            events.as_slice(),
            [EngineEvent::SessionCreated { limit: 10, .. }]
        ));
        assert_eq!(engine.state.workers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configuration_change_reattaches() {
        let mut engine = create_test_engine();
        engine.start().unwrap();
        pump(&mut engine, 35).await;
        engine.drain_events();

        engine.process_message(Message::ConfigurationChange);

        let events = engine.drain_events();
        assert!(matches!(
            events.as_slice(),
            [
                EngineEvent::ObserverDetached { .. },
                EngineEvent::SessionReattached { position, .. }
            ] if *position > 0
        ));
        assert_eq!(engine.state.workers.len(), 1);
        assert!(!engine.should_quit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_ends_session_and_quits() {
        let mut engine = create_test_engine();
        engine.start().unwrap();

        engine.process_message(Message::Finish);

        assert!(engine.should_quit());
        assert!(engine.state.workers.is_empty());
        assert!(engine.state.screen.is_none());
        assert!(engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, EngineEvent::SessionEnded { .. })));

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifying_service_lifecycle() {
        let mut engine = create_test_engine();
        engine.process_message(Message::StartNotifying);
        assert_eq!(engine.state.services.len(), 1);

        pump(&mut engine, 1_000).await;

        let events = engine.drain_events();
        let notifications = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::Notification { .. }))
            .count();
        assert_eq!(notifications, 3);
        assert!(matches!(
            events.last(),
            Some(EngineEvent::ServiceStopped {
                reason: apidemo_core::StopReason::Completed,
                ..
            })
        ));
        assert!(engine.state.services.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_joins_everything() {
        let mut engine = create_test_engine();
        engine.start().unwrap();
        engine.process_message(Message::StartNotifying);
        let worker = engine
            .state
            .workers
            .get(&engine.state.session_key)
            .cloned()
            .unwrap();

        engine.shutdown().await;

        assert!(worker.is_finished());
        assert!(engine.state.workers.is_empty());
        assert!(engine.state.services.is_empty());
        assert!(engine.should_quit());
    }
}

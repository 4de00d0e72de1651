//! Observer side of a retained worker
//!
//! A [`ProgressScreen`] is the transient, UI-owned half of the pattern. It is
//! created and destroyed many times over one session (every configuration
//! change), while the [`RetainedWorker`] it renders lives in the [`Registry`]
//! under the session key and is reused by each new screen.
//!
//! The one decision that matters is in [`ProgressScreen::on_destroy`]: a
//! [`Teardown::ConfigurationChange`] only detaches, a [`Teardown::Finishing`]
//! shuts the worker down and unregisters it.

use tokio::sync::mpsc;

use apidemo_core::prelude::*;
use apidemo_core::{next_observer_token, ObserverToken, ProgressUpdate, SessionKey, WorkerSnapshot};

use crate::message::Message;
use crate::observer::ChannelObserver;
use crate::registry::Registry;
use crate::worker::{RetainedWorker, WorkerConfig};

const BAR_WIDTH: usize = 30;

/// Why a screen is being torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The screen will be recreated right away; the session continues
    ConfigurationChange,
    /// The session is over
    Finishing,
}

/// How a screen got its worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachKind {
    /// No worker was registered under the key; a new one was started
    Created,
    /// An existing worker was found and reattached
    Reattached,
}

/// Rendering handle owned by the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressBar {
    value: u32,
    max: u32,
}

impl ProgressBar {
    pub fn new(value: u32, max: u32) -> Self {
        Self { value, max }
    }

    pub fn set(&mut self, update: ProgressUpdate) {
        self.value = update.position;
        self.max = update.limit;
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Text rendering, e.g. `[#######.......] 250/500`
    pub fn render(&self) -> String {
        let filled = if self.max == 0 {
            BAR_WIDTH
        } else {
            (self.value.min(self.max) as usize * BAR_WIDTH) / self.max as usize
        };
        format!(
            "[{}{}] {}/{}",
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            self.value,
            self.max
        )
    }
}

/// UI-owned observer of a retained worker
#[derive(Debug)]
pub struct ProgressScreen {
    key: SessionKey,
    token: ObserverToken,
    worker: RetainedWorker,
    bar: Option<ProgressBar>,
}

impl ProgressScreen {
    /// Find the worker registered under `key`, or create, register, and start
    /// one, then attach this screen to it.
    pub fn on_create(
        workers: &mut Registry<RetainedWorker>,
        key: SessionKey,
        config: WorkerConfig,
        msg_tx: mpsc::Sender<Message>,
    ) -> Result<(Self, AttachKind)> {
        let token = next_observer_token();
        let observer = ChannelObserver::spawn(key.clone(), token, msg_tx)?;

        let existing = workers
            .get(&key)
            .filter(|worker| !worker.snapshot().quitting)
            .cloned();

        let (worker, kind) = match existing {
            Some(worker) => (worker, AttachKind::Reattached),
            None => {
                let worker = RetainedWorker::new(config);
                if workers.replace(key.clone(), worker.clone())?.is_some() {
                    warn!("Replaced a stopped worker registered under '{}'", key);
                }
                if let Err(e) = worker.start() {
                    workers.remove(&key);
                    return Err(e);
                }
                (worker, AttachKind::Created)
            }
        };

        let snapshot = worker.attach(observer);

        info!(
            "Screen {} attached to '{}' ({:?}, position {}/{})",
            token, key, kind, snapshot.position, snapshot.limit
        );

        let screen = Self {
            key,
            token,
            worker,
            bar: Some(ProgressBar::new(snapshot.position, snapshot.limit)),
        };
        Ok((screen, kind))
    }

    /// Tear this screen down.
    ///
    /// Returns the worker when the session ended so the caller can join it.
    pub fn on_destroy(
        mut self,
        teardown: Teardown,
        workers: &mut Registry<RetainedWorker>,
    ) -> Option<RetainedWorker> {
        match teardown {
            Teardown::ConfigurationChange => {
                self.worker.detach();
                self.bar = None;
                debug!("Screen {} detached from '{}'", self.token, self.key);
                None
            }
            Teardown::Finishing => {
                self.worker.shutdown();
                self.bar = None;
                workers.remove(&self.key);
                info!("Session '{}' finished", self.key);
                Some(self.worker)
            }
        }
    }

    /// Apply progress marshaled from the worker.
    ///
    /// Returns `false` when the update was addressed to another attachment
    /// (e.g. posted just before a configuration change) and was dropped.
    pub fn apply_progress(&mut self, token: ObserverToken, update: ProgressUpdate) -> bool {
        if token != self.token {
            trace!(
                "Dropping progress for stale attachment {} (current {})",
                token,
                self.token
            );
            return false;
        }
        match self.bar.as_mut() {
            Some(bar) => {
                bar.set(update);
                true
            }
            None => false,
        }
    }

    pub fn restart(&self) {
        self.worker.restart();
    }

    pub fn set_limit(&self, limit: u32) {
        self.worker.set_limit(limit);
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        self.worker.snapshot()
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn token(&self) -> ObserverToken {
        self.token
    }

    pub fn bar(&self) -> Option<&ProgressBar> {
        self.bar.as_ref()
    }
}

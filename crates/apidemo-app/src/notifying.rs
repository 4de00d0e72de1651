//! Single-shot notifying service
//!
//! Posts a fixed number of mood notifications at a fixed interval, then stops
//! itself. Unlike a [`RetainedWorker`](crate::worker::RetainedWorker) it has no
//! observer to lose: it talks to the host only through the message channel.
//!
//! The task runs until:
//! - every round has been posted (`StopReason::Completed`), or
//! - the stop channel receives `true` (`StopReason::Cancelled`), or
//! - the host channel is closed (engine shutting down, nothing is reported).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use apidemo_core::prelude::*;
use apidemo_core::{Mood, SessionKey, StopReason};

use crate::config::NotifierSettings;
use crate::message::Message;

/// Registry key of the demo's notifying service
pub const NOTIFYING_SERVICE_KEY: &str = "notifying-service";

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one run of a service, so a late stop report from a previous run
/// is not mistaken for the current one
pub type ServiceRun = u64;

/// Handle to a running notifying service
#[derive(Debug)]
pub struct NotifyingService {
    key: SessionKey,
    run: ServiceRun,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl NotifyingService {
    /// Spawn the service task on the current tokio runtime
    pub fn spawn(
        key: SessionKey,
        settings: &NotifierSettings,
        msg_tx: mpsc::Sender<Message>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::runtime(format!("cannot start notifying service: {}", e)))?;

        let run = RUN_COUNTER.fetch_add(1, Ordering::SeqCst);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(run_notifier(
            key.clone(),
            run,
            settings.rounds,
            settings.interval(),
            msg_tx,
            stop_rx,
        ));

        info!(
            "Notifying service '{}' started ({} rounds every {:?})",
            key,
            settings.rounds,
            settings.interval()
        );

        Ok(Self {
            key,
            run,
            stop_tx,
            handle,
        })
    }

    /// Ask the service to stop. It reports `Cancelled` once it has.
    pub fn stop(&self) {
        // Err means the task already exited and dropped its receiver
        if self.stop_tx.send(true).is_err() {
            debug!("Notifying service '{}' already stopped", self.key);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn run(&self) -> ServiceRun {
        self.run
    }

    /// Wait for the task to exit
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("Notifying service '{}' ended abnormally: {}", self.key, e);
        }
    }
}

async fn run_notifier(
    key: SessionKey,
    run: ServiceRun,
    rounds: u32,
    interval: Duration,
    msg_tx: mpsc::Sender<Message>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let reason = 'rounds: {
        for round in 1..=rounds {
            for mood in Mood::ALL {
                if *stop_rx.borrow() {
                    break 'rounds StopReason::Cancelled;
                }

                let notification = Message::Notification {
                    service: key.clone(),
                    round,
                    mood,
                };
                if msg_tx.send(notification).await.is_err() {
                    debug!("Host channel closed, notifying service '{}' exiting", key);
                    return;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    // A dropped sender counts as a stop request too
                    _ = stop_rx.changed() => break 'rounds StopReason::Cancelled,
                }
            }
        }
        StopReason::Completed
    };

    info!("Notifying service '{}' stopped ({})", key, reason);
    let _ = msg_tx
        .send(Message::NotifyingStopped {
            service: key,
            run,
            reason,
        })
        .await;
}

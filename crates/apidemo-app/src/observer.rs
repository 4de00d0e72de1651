//! Marshals worker progress onto the host's message channel
//!
//! The worker publishes under its lock and must never wait on the host, while
//! the host must always end up seeing the latest position, even when its
//! channel was full at the moment the worker reached the limit and parked.
//!
//! Each attachment therefore gets a `watch` slot holding only the newest
//! [`ProgressUpdate`]. Publishing overwrites the slot; a forwarding task sends
//! whatever is newest into the host channel, waiting for room when it is full.
//! Intermediate values may be coalesced away, the last one never is.

use tokio::sync::{mpsc, watch};

use apidemo_core::prelude::*;
use apidemo_core::{ObserverToken, ProgressUpdate, SessionKey};

use crate::message::Message;
use crate::worker::ProgressSink;

/// [`ProgressSink`] that forwards progress to the host loop as
/// [`Message::Progress`] tagged with the attachment's token.
///
/// The forwarding task ends once the observer is dropped (on detach or
/// shutdown) and its last value has been delivered, or when the host channel
/// closes.
#[derive(Debug)]
pub struct ChannelObserver {
    key: SessionKey,
    latest: watch::Sender<Option<ProgressUpdate>>,
}

impl ChannelObserver {
    /// Create the observer and spawn its forwarding task on the current runtime
    pub fn spawn(
        key: SessionKey,
        token: ObserverToken,
        msg_tx: mpsc::Sender<Message>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::runtime(format!("cannot start progress forwarder: {}", e)))?;

        let (latest, latest_rx) = watch::channel(None);
        runtime.spawn(forward_progress(key.clone(), token, latest_rx, msg_tx));

        Ok(Self { key, latest })
    }
}

impl ProgressSink for ChannelObserver {
    fn on_progress(&self, update: ProgressUpdate) {
        // Never blocks; a pending value is overwritten by the newer one
        self.latest.send_replace(Some(update));
        trace!("Progress {} queued for '{}'", update.position, self.key);
    }
}

async fn forward_progress(
    key: SessionKey,
    token: ObserverToken,
    mut latest_rx: watch::Receiver<Option<ProgressUpdate>>,
    msg_tx: mpsc::Sender<Message>,
) {
    // An unseen value is still reported after the sender is dropped
    while latest_rx.changed().await.is_ok() {
        let Some(update) = *latest_rx.borrow_and_update() else {
            continue;
        };

        let msg = Message::Progress {
            key: key.clone(),
            token,
            update,
        };
        if msg_tx.send(msg).await.is_err() {
            debug!("Host channel closed, dropping progress for '{}'", key);
            return;
        }
    }

    trace!("Progress forwarder {} for '{}' exiting", token, key);
}

//! Retained background worker
//!
//! A [`RetainedWorker`] advances a progress counter on its own tokio task,
//! independently of whichever observer currently renders it. Observers come and
//! go through [`RetainedWorker::attach`] / [`RetainedWorker::detach`]; the worker
//! survives them and is only torn down by [`RetainedWorker::shutdown`].
//!
//! **Locking:** every read and write of the position, limit, readiness flag,
//! quit flag, and observer happens under one mutex. Progress is published to the
//! observer while that mutex is held, so once `detach` returns the loop can no
//! longer reach the observer it dropped. The mutex is never held across an
//! `.await`.
//!
//! **Parking:** when no observer is attached, or the limit has been reached, the
//! loop waits on a [`Notify`] with a timeout. Every mutator wakes it, so a park
//! normally ends long before the timeout; the timeout only bounds how stale the
//! loop's view can get.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use apidemo_core::prelude::*;
use apidemo_core::{ProgressUpdate, WorkerSnapshot};

/// Receives progress from a worker.
///
/// Called with the worker lock held: implementations must not block and must
/// not call back into the worker.
pub trait ProgressSink: Send + 'static {
    fn on_progress(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Send + 'static,
{
    fn on_progress(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Loop pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTiming {
    /// Simulated work after each increment
    pub tick: Duration,
    /// Longest single park before the loop re-checks its state
    pub wait_timeout: Duration,
}

impl Default for WorkerTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            wait_timeout: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Initial limit; observers may change it with [`RetainedWorker::set_limit`]
    pub limit: u32,
    pub timing: WorkerTiming,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            limit: 500,
            timing: WorkerTiming::default(),
        }
    }
}

struct WorkerState {
    position: u32,
    limit: u32,
    ready: bool,
    quitting: bool,
    started: bool,
    exited: bool,
    observer: Option<Box<dyn ProgressSink>>,
}

impl WorkerState {
    fn publish(&self) {
        if !self.ready {
            return;
        }
        if let Some(observer) = &self.observer {
            observer.on_progress(ProgressUpdate {
                position: self.position,
                limit: self.limit,
            });
        }
    }

    fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            position: self.position,
            limit: self.limit,
            ready: self.ready,
            quitting: self.quitting,
            running: self.started && !self.exited,
        }
    }
}

struct Shared {
    state: Mutex<WorkerState>,
    wake: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        // The state stays consistent even if an observer panicked mid-publish
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a retained worker. Clones share the same worker.
#[derive(Clone)]
pub struct RetainedWorker {
    shared: Arc<Shared>,
    timing: WorkerTiming,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for RetainedWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetainedWorker")
            .field("state", &self.snapshot())
            .field("timing", &self.timing)
            .finish()
    }
}

impl RetainedWorker {
    /// Create a worker. The loop does not run until [`start`](Self::start).
    pub fn new(config: WorkerConfig) -> Self {
        let state = WorkerState {
            position: 0,
            limit: config.limit,
            ready: false,
            quitting: false,
            started: false,
            exited: false,
            observer: None,
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                wake: Notify::new(),
            }),
            timing: config.timing,
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the loop on the current tokio runtime.
    ///
    /// Calling this again, or after [`shutdown`](Self::shutdown), does nothing.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::runtime(format!("cannot start worker: {}", e)))?;

        {
            let mut state = self.shared.lock();
            if state.started || state.quitting {
                debug!(
                    "Ignoring start (started: {}, quitting: {})",
                    state.started, state.quitting
                );
                return Ok(());
            }
            state.started = true;
        }

        let handle = runtime.spawn(run_loop(Arc::clone(&self.shared), self.timing));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Attach an observer and wake the loop.
    ///
    /// Returns the state as of the attach, so the observer can render the
    /// current position before the next update arrives. Ignored after shutdown.
    pub fn attach(&self, observer: impl ProgressSink) -> WorkerSnapshot {
        let snapshot = {
            let mut state = self.shared.lock();
            if state.quitting {
                debug!("Ignoring attach: worker is shutting down");
                return state.snapshot();
            }
            state.observer = Some(Box::new(observer));
            state.ready = true;
            state.snapshot()
        };
        self.shared.wake.notify_one();
        snapshot
    }

    /// Detach the current observer.
    ///
    /// When this returns the loop has finished any publish in progress and will
    /// not publish again until the next [`attach`](Self::attach).
    pub fn detach(&self) {
        let observer = {
            let mut state = self.shared.lock();
            state.ready = false;
            state.observer.take()
        };
        // Dropped outside the lock
        drop(observer);
    }

    /// Reset the position to 0 and wake the loop. Ignored after shutdown.
    pub fn restart(&self) {
        {
            let mut state = self.shared.lock();
            if state.quitting {
                debug!("Ignoring restart: worker is shutting down");
                return;
            }
            state.position = 0;
            state.publish();
        }
        self.shared.wake.notify_one();
    }

    /// Change the limit. A position above the new limit is clamped to it.
    /// Ignored after shutdown.
    pub fn set_limit(&self, limit: u32) {
        {
            let mut state = self.shared.lock();
            if state.quitting {
                debug!("Ignoring limit change: worker is shutting down");
                return;
            }
            state.limit = limit;
            if state.position > limit {
                state.position = limit;
            }
            state.publish();
        }
        self.shared.wake.notify_one();
    }

    /// Request the loop to exit. Cooperative: the loop observes the flag at its
    /// next wake, which this call triggers.
    pub fn shutdown(&self) {
        let observer = {
            let mut state = self.shared.lock();
            if state.quitting {
                return;
            }
            state.quitting = true;
            state.ready = false;
            state.observer.take()
        };
        drop(observer);
        self.shared.wake.notify_one();
    }

    /// Wait for the loop task to exit. Returns immediately if it never started
    /// or has already been joined.
    pub async fn join(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Worker task ended abnormally: {}", e);
            }
        }
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        self.shared.lock().snapshot()
    }

    /// The loop has exited
    pub fn is_finished(&self) -> bool {
        self.shared.lock().exited
    }
}

async fn run_loop(shared: Arc<Shared>, timing: WorkerTiming) {
    debug!("Worker loop started");

    loop {
        let advanced = {
            let mut state = shared.lock();
            if state.quitting {
                state.exited = true;
                break;
            }
            if state.ready && state.position < state.limit {
                state.position += 1;
                state.publish();
                true
            } else {
                false
            }
        };

        if advanced {
            tokio::time::sleep(timing.tick).await;
        } else {
            // Timing out is not an error, the loop just re-checks
            let _ = tokio::time::timeout(timing.wait_timeout, shared.wake.notified()).await;
        }
    }

    debug!("Worker loop exited");
}

//! apidemo-app - Retained workers and host orchestration for apidemo
//!
//! The centerpiece is [`RetainedWorker`]: a background loop whose state
//! survives the destruction and recreation of the screen observing it. A
//! [`ProgressScreen`] finds its worker in a [`Registry`] by session key and
//! either detaches (configuration change) or shuts it down (session end) when
//! torn down.
//!
//! Around it sits a TEA (The Elm Architecture) host: [`Message`]s in, the
//! [`handler::update`] function, [`UpdateAction`]s executed by the [`Engine`],
//! and [`EngineEvent`]s out.

pub mod capability;
pub mod config;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod host;
pub mod message;
pub mod notifying;
pub mod observer;
pub mod registry;
pub mod state;
pub mod worker;

// Re-export primary types
pub use capability::{Button, Clickable, Controls, Selectable, Spinner};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{UpdateAction, UpdateResult};
pub use host::{AttachKind, ProgressBar, ProgressScreen, Teardown};
pub use message::Message;
pub use notifying::{NotifyingService, ServiceRun, NOTIFYING_SERVICE_KEY};
pub use observer::ChannelObserver;
pub use registry::{Registry, MAX_COMPONENTS};
pub use state::AppState;
pub use worker::{ProgressSink, RetainedWorker, WorkerConfig, WorkerTiming};

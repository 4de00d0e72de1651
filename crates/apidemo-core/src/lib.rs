//! # apidemo-core - Core Domain Types
//!
//! Foundation crate for apidemo. Provides domain types, error handling, and
//! logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`SessionKey`] - Stable key a retained component is registered under
//! - [`ObserverToken`] - Identity of a single observer attachment
//! - [`ProgressUpdate`], [`WorkerSnapshot`] - Worker progress and state views
//! - [`Mood`], [`StopReason`] - Notifying service payloads
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `is_fatal` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use apidemo_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all apidemo crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use types::{
    next_observer_token, AppPhase, Mood, ObserverToken, ProgressUpdate, SessionKey, StopReason,
    WorkerSnapshot,
};

//! apidemo Library
//!
//! Headless host for retained background workers. All worker, registry, and
//! engine logic lives in `apidemo-app`; this crate adds the NDJSON frontend.

pub mod headless;

// Re-export main entry point
pub use headless::runner::run_headless;

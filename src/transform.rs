//! Per-overlay transform model and the gesture stream that drives it.
//!
//! Everything here runs on the gesture path: no IO, no logging, no locks.

pub(crate) mod gesture;
pub(crate) mod state;

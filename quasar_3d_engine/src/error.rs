//! Error types for the Quasar3D engine
//!
//! Every failure in the core is fatal and propagates to the caller as one
//! of these variants. There is no retry or degraded-mode recovery anywhere:
//! partially constructed GPU objects are unsafe to leave alive, so the
//! policy is fail-fast and let the surrounding application decide.

use std::fmt;

/// Result type for Quasar3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Quasar3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (device-object creation returned a failed handle)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or misuse (empty required field, wrong asset kind,
    /// payload size mismatch), raised before any device call is attempted
    InvalidResource(String),

    /// A named dependency (asset, manager, layout type, render-pass kind)
    /// was not found in a lookup
    MissingDependency(String),

    /// A fence or queue wait exceeded its bound; signals a stuck or lost
    /// device, never retried
    SyncTimeout(String),

    /// Initialization failed (device bring-up, subsystem construction)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::MissingDependency(msg) => write!(f, "Missing dependency: {}", msg),
            Error::SyncTimeout(msg) => write!(f, "Synchronization timeout: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

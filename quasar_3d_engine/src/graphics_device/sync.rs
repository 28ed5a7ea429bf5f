/// Fence and semaphore traits

use std::time::Duration;
use crate::error::Result;

/// CPU-observable synchronization primitive, signaled when submitted GPU
/// work completes.
///
/// Every wait in the engine is bounded: `wait` returns
/// `Error::SyncTimeout` when the timeout elapses, which callers treat as
/// a stuck or lost device (fatal, never retried).
pub trait Fence: Send + Sync {
    /// Block until the fence signals or the timeout elapses
    fn wait(&self, timeout: Duration) -> Result<()>;

    /// Reset the fence to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Query the current state without blocking
    fn is_signaled(&self) -> bool;
}

/// GPU-side synchronization primitive ordering work between queue
/// submissions. Opaque to the CPU.
pub trait Semaphore: Send + Sync {}

/// Tests for engine error types
///
/// Validates Display formatting, cloning, and std::error::Error conformance.

use super::*;

// ============================================================================
// Tests: Display formatting
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("image creation failed".to_string());
    assert_eq!(err.to_string(), "Backend error: image creation failed");
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(err.to_string(), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("empty name".to_string());
    assert_eq!(err.to_string(), "Invalid resource: empty name");
}

#[test]
fn test_missing_dependency_display() {
    let err = Error::MissingDependency("pipeline layout 'Pbr'".to_string());
    assert_eq!(err.to_string(), "Missing dependency: pipeline layout 'Pbr'");
}

#[test]
fn test_sync_timeout_display() {
    let err = Error::SyncTimeout("upload fence".to_string());
    assert_eq!(err.to_string(), "Synchronization timeout: upload fence");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no device".to_string());
    assert_eq!(err.to_string(), "Initialization failed: no device");
}

// ============================================================================
// Tests: Clone and Debug
// ============================================================================

#[test]
fn test_error_clone() {
    let err = Error::MissingDependency("mesh".to_string());
    let cloned = err.clone();
    assert_eq!(err.to_string(), cloned.to_string());
}

#[test]
fn test_error_debug_contains_variant() {
    let err = Error::SyncTimeout("frame fence".to_string());
    let debug = format!("{:?}", err);
    assert!(debug.contains("SyncTimeout"));
}

// ============================================================================
// Tests: std::error::Error conformance
// ============================================================================

#[test]
fn test_error_is_std_error() {
    fn assert_std_error<E: std::error::Error>(_e: &E) {}
    assert_std_error(&Error::OutOfMemory);
}

#[test]
fn test_result_alias_propagates() {
    fn fails() -> Result<()> {
        Err(Error::BackendError("boom".to_string()))
    }
    fn outer() -> Result<()> {
        fails()?;
        Ok(())
    }
    assert!(outer().is_err());
}

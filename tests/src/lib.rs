//! apirun Integration Tests
//!
//! This package provides integration tests that exercise multiple apirun
//! crates together. Test files are in the `tests/` directory and are
//! automatically discovered by Cargo.

// Common fixtures for integration tests
pub mod fixtures;

// Re-export commonly used types
pub use fixtures::*;

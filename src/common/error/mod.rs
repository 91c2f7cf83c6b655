//! Unified error types for the import library.
//!
//! This module provides the single error type returned by the top-level
//! entry points of every decoder.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};

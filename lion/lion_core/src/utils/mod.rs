//! Utility functions and types.
//!
//! This module provides various utility functions and types used throughout
//! the system.

pub mod logging;

pub use logging::LogLevel;

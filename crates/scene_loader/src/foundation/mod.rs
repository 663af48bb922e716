//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the loader:
//! - Handle-based collections for host-side storage
//! - Logging utilities

pub mod collections;
pub mod logging;

//! # Core Module
//!
//! Shared abstractions used across the loader.
//!
//! ## Organization
//!
//! - **Config**: Loader and application configuration types
//! - **Foundation**: Low-level utilities (collections, logging)

pub mod config;

pub use crate::foundation;

pub use config::{ApplicationConfig, Config, ConfigError, ConfigFormat, LoaderConfig};

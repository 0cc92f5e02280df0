//! Configuration and profile management for dbactl
//!
//! Provides the configuration system for the administrative tools:
//!
//! - Multiple named connection profiles
//! - Environment variable expansion in config files
//! - Platform-specific config file locations
//! - A resolvable state directory holding the metadata file and sandboxes

#![allow(clippy::module_inception)]

pub mod config;
pub mod error;

pub use config::{Config, Profile};
pub use error::{ConfigError, Result};

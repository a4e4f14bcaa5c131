//! # Core Runtime Module
//!
//! Shared configuration used by every subsystem of the runtime.
//!
//! ## Organization
//!
//! - **Config**: runtime and scene settings, loadable from TOML or RON

pub mod config;

pub use config::{RuntimeConfig, SceneSettings};
pub use crate::config::{Config, ConfigError};

//! # Core Module
//!
//! Shared settings used across the collision subsystems.

pub mod config;

pub use config::{ColdetConfig, Config, ConfigError, ConfigFormat};

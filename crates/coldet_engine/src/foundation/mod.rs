//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the rigid transform
//! - Logging utilities

pub mod math;
pub mod logging;

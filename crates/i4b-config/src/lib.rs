//! i4b layer 4 configuration management
//!
//! This crate provides configuration loading and parsing for the ISDN layer 4:
//! - TOML configuration file parsing
//! - Stack configuration structures and validation

pub mod stack_config;
pub mod toml_config;

pub use stack_config::*;
pub use toml_config::*;

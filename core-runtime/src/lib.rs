//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the listening-history core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities every other crate depends on. It
//! establishes the logging conventions and the explicit configuration value
//! that is threaded through constructors.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{WrappedConfig, WrappedConfigBuilder};
pub use error::{Error, Result};

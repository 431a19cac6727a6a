//! Shared utilities for rank-tracker
//!
//! This crate provides common functionality used across the rank-tracker workspace,
//! currently logging setup and its configuration.

pub mod config;
pub mod logging;

pub use config::LogConfig;
pub use logging::{init_tracing, init_tracing_with};

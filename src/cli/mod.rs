//! CLI-specific functionality
//!
//! This module contains all CLI-related code including argument parsing,
//! task file loading, and configuration discovery.

pub mod args;
pub mod config;
pub mod tasks;

pub use args::{Args, ExecutionMode, PlanConfig, RunConfig};
pub use config::ConfigDiscovery;
pub use tasks::{LoadError, TaskLoader};

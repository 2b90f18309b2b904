//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the dashboard core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the auth and dashboard
//! crates depend on. It establishes the logging conventions, configuration
//! validation, and event broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{DashboardConfig, DashboardConfigBuilder};
pub use error::{Error, Result};
pub use events::{AuthEvent, CoreEvent, EventBus, PanelEvent};

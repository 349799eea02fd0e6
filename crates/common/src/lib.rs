//! Common utilities for usb-notify
//!
//! This crate provides the process-level pieces shared by the notify
//! binaries: error handling for setup paths and tracing initialization.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::setup_logging;

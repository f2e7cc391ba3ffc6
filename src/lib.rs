//! nagnotify - alert notification formatting and delivery
//!
//! This library turns the variables a monitoring system exports for a
//! notification command into a formatted e-mail or pager message, optionally
//! with metric graphs attached, and sends or prints it.

pub mod app;
pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod formatting;
pub mod graphs;
pub mod notification;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;
pub use crate::error::{NotifyError, Result};

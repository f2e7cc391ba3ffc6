//! Core domain types and service traits for nagnotify
//!
//! This module defines the small vocabulary shared by the formatter, the graph
//! helper and the senders, plus the trait contracts for every external
//! collaborator (monitoring variables, inventory, image download, mail).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::NotifyError;
use crate::graphs::{GraphError, InventoryError};
use crate::notification::Message;

/// Whether an alert concerns a host or a service on that host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateType {
    Host,
    Service,
}

impl StateType {
    /// The label used in subjects ("Host" / "Service").
    pub fn label(&self) -> &'static str {
        match self {
            StateType::Host => "Host",
            StateType::Service => "Service",
        }
    }

    /// The monitoring variable prefix for state-dependent fields.
    pub fn prefix(&self) -> &'static str {
        match self {
            StateType::Host => "HOST",
            StateType::Service => "SERVICE",
        }
    }
}

/// The delivery channel a formatter produces content for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Email,
    Pager,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Email => write!(f, "email"),
            MessageType::Pager => write!(f, "pager"),
        }
    }
}

/// The alert lifecycle tag supplied by the monitoring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Problem,
    Recovery,
    Acknowledgement,
    FlappingStart,
    FlappingStop,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Problem => "PROBLEM",
            NotificationType::Recovery => "RECOVERY",
            NotificationType::Acknowledgement => "ACKNOWLEDGEMENT",
            NotificationType::FlappingStart => "FLAPPINGSTART",
            NotificationType::FlappingStop => "FLAPPINGSTOP",
        }
    }
}

impl FromStr for NotificationType {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROBLEM" => Ok(NotificationType::Problem),
            "RECOVERY" => Ok(NotificationType::Recovery),
            "ACKNOWLEDGEMENT" => Ok(NotificationType::Acknowledgement),
            "FLAPPINGSTART" => Ok(NotificationType::FlappingStart),
            "FLAPPINGSTOP" => Ok(NotificationType::FlappingStop),
            other => Err(NotifyError::UnknownNotificationType(other.to_string())),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Reads named monitoring variables for the current alert event.
pub trait VariableSource {
    /// Returns the value of `name` (e.g. `"HOSTNAME"`), or an empty string if
    /// the variable is not set. Never fails.
    fn get(&self, name: &str) -> String;
}

/// Resolves the metrics cluster a host reports into.
pub trait InventoryLookup {
    /// # Returns
    /// * `Ok(cluster)` when the host is known and carries a cluster name
    /// * `Err(InventoryError::NotFound)` when no node matches the host
    /// * `Err(InventoryError::NoCluster)` when the node has no cluster attribute
    /// * `Err(InventoryError::Query)` when the inventory itself could not be queried
    fn cluster_for(&self, host: &str) -> Result<String, InventoryError>;
}

/// Downloads a single image to a local path.
pub trait ImageDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), GraphError>;
}

/// Hands an assembled message to a mail transport.
pub trait MailDelivery {
    /// Delivers the message. Transport failures are returned as-is; there is
    /// no retry.
    fn deliver(&self, message: &Message) -> Result<(), NotifyError>;
}

//! Access to the monitoring variables describing one alert event.
//!
//! The monitoring system exports its macros as `NAGIOS_<NAME>` environment
//! variables. [`NotificationContext`] takes a single snapshot of the ones the
//! formatters use; a missing variable is simply an empty field.

use std::collections::HashMap;

use crate::core::{MessageType, StateType, VariableSource};

const ENV_PREFIX: &str = "NAGIOS_";

/// Reads monitoring variables from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl VariableSource for EnvSource {
    /// Values that are not valid UTF-8 (plugins printing Latin-1, for
    /// instance) are decoded lossily rather than dropped.
    fn get(&self, name: &str) -> String {
        std::env::var_os(format!("{ENV_PREFIX}{name}"))
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// An in-memory variable source, keyed by the bare macro name (`"HOSTNAME"`).
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    vars: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl VariableSource for MapSource {
    fn get(&self, name: &str) -> String {
        self.vars.get(name).cloned().unwrap_or_default()
    }
}

/// Decodes the escaping the monitoring system applies to plugin output.
///
/// `\n` and `\t` become real control characters and `\\` a single backslash.
/// Any other escape sequence, and a trailing lone backslash, is kept as-is.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// A read-only snapshot of the monitoring variables for one alert event.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContext {
    pub state_type: StateType,
    pub hostname: String,
    pub host_address: String,
    pub service_desc: String,
    pub state: String,
    pub duration: String,
    pub attempt: String,
    pub max_attempts: String,
    pub output: String,
    pub long_output: String,
    pub notes: String,
    pub notes_url: String,
    pub action_url: String,
    pub ack_author: String,
    pub ack_comment: String,
    pub notification_type: String,
    pub notification_number: String,
    pub timestamp: String,
    /// Contact names the monitoring system notified for this event.
    pub recipients: Vec<String>,
    pub contact_email: String,
    pub contact_pager: String,
}

impl NotificationContext {
    /// Reads every field once from `source`.
    ///
    /// The state type is `Service` exactly when `SERVICESTATE` is non-empty;
    /// state-dependent fields are then read from the `SERVICE*` variables,
    /// otherwise from the `HOST*` ones.
    pub fn from_source(source: &dyn VariableSource) -> Self {
        let state_type = if source.get("SERVICESTATE").is_empty() {
            StateType::Host
        } else {
            StateType::Service
        };
        let p = state_type.prefix();
        let scoped = |suffix: &str| source.get(&format!("{p}{suffix}"));

        let notification_number = match source.get("NOTIFICATIONNUMBER") {
            n if n.is_empty() => scoped("NOTIFICATIONNUMBER"),
            n => n,
        };

        Self {
            state_type,
            hostname: source.get("HOSTNAME"),
            host_address: source.get("HOSTADDRESS"),
            service_desc: source.get("SERVICEDESC"),
            state: scoped("STATE"),
            duration: scoped("DURATION"),
            attempt: scoped("ATTEMPT"),
            max_attempts: source.get(&format!("MAX{p}ATTEMPTS")),
            output: unescape(&scoped("OUTPUT")),
            long_output: unescape(&source.get(&format!("LONG{p}OUTPUT"))),
            notes: scoped("NOTES"),
            notes_url: scoped("NOTESURL"),
            action_url: scoped("ACTIONURL"),
            ack_author: scoped("ACKAUTHOR"),
            ack_comment: scoped("ACKCOMMENT"),
            notification_type: source.get("NOTIFICATIONTYPE"),
            notification_number,
            timestamp: source.get("LONGDATETIME"),
            recipients: split_list(&source.get("NOTIFICATIONRECIPIENTS")),
            contact_email: source.get("CONTACTEMAIL"),
            contact_pager: source.get("CONTACTPAGER"),
        }
    }

    /// Whether this is a service alert that names its service.
    pub fn has_service(&self) -> bool {
        self.state_type == StateType::Service && !self.service_desc.is_empty()
    }

    /// `host/service` for a named service alert, otherwise `host`.
    pub fn target(&self) -> String {
        if self.has_service() {
            format!("{}/{}", self.hostname, self.service_desc)
        } else {
            self.hostname.clone()
        }
    }

    /// The contact address the monitoring system supplied for a channel.
    pub fn contact_for(&self, message_type: MessageType) -> Vec<String> {
        match message_type {
            MessageType::Email => split_list(&self.contact_email),
            MessageType::Pager => split_list(&self.contact_pager),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

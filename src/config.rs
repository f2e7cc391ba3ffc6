//! Configuration management for nagnotify
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer built-in defaults, a `nagnotify.toml` file, environment
//! variables and finally the command-line arguments.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::formatting::FormatterSettings;

/// Where the configuration file is looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nagnotify/nagnotify.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Name of the formatter variant to use (e.g. "email", "pager").
    pub formatter: String,
    /// Print the message instead of sending it.
    #[serde(default)]
    pub dry_run: bool,
    /// Explicit recipients. When empty, the contact address supplied by the
    /// monitoring system is used.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Overrides the notification type read from the monitoring variables.
    pub notification_type: Option<String>,
    /// Base URL of the monitoring web UI.
    pub monitoring_url: Option<String>,
    /// CSS applied to recovery sections in HTML mail.
    pub success_style: String,
    /// Parent directory for per-run scratch directories.
    pub scratch_root: Option<PathBuf>,
    /// Configuration for mail delivery.
    pub mail: MailConfig,
    /// Configuration for graph attachments.
    pub graphs: GraphsConfig,
    /// Configuration for host inventory lookups.
    pub inventory: InventoryConfig,
}

/// How outgoing mail leaves the machine.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    Smtp,
    Sendmail,
}

/// Transport security for SMTP connections.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTlsMode {
    /// Plaintext. Only allowed without credentials.
    None,
    /// Upgrade the connection with STARTTLS; fail if the server cannot.
    Starttls,
    /// TLS from the first byte (SMTPS, usually port 465).
    Wrapper,
}

/// Configuration for mail delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MailConfig {
    /// The sender address.
    pub from: String,
    pub transport: MailTransportKind,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// `none` is only accepted when no credentials are configured.
    pub tls: MailTlsMode,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Path to the sendmail binary. Defaults to lettre's `sendmail` lookup.
    pub sendmail_command: Option<String>,
}

/// Configuration for graph attachments.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GraphsConfig {
    /// Base URL of the metrics front end. Graphs are disabled when unset.
    pub base_url: Option<String>,
    /// Metrics to attach, one graph each.
    pub metrics: Vec<String>,
    /// Time range passed to the graph endpoint (e.g. "hour", "day").
    pub range: String,
    /// Download timeout in seconds.
    pub timeout_seconds: u64,
}

/// The inventory used to resolve a host's metrics cluster.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InventoryProvider {
    Knife,
    Static,
}

/// Configuration for host inventory lookups.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InventoryConfig {
    pub provider: InventoryProvider,
    /// The knife executable (knife provider).
    pub knife_command: String,
    /// Dotted node attribute holding the cluster name (knife provider).
    pub cluster_attribute: String,
    /// Host to cluster table (static provider).
    #[serde(default)]
    pub clusters: HashMap<String, String>,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in increasing priority: built-in defaults, the TOML
    /// file named by `--config` (or [`DEFAULT_CONFIG_PATH`]), `NAGNOTIFY_`
    /// environment variables (`__` separates nested keys, e.g.
    /// `NAGNOTIFY_MAIL__SMTP_HOST`), then the command-line arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        if cli.config.is_some() && !path.exists() {
            anyhow::bail!("configuration file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("NAGNOTIFY_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }

    /// The presentation settings handed to formatters.
    pub fn formatter_settings(&self) -> FormatterSettings {
        FormatterSettings {
            monitoring_url: self.monitoring_url.clone(),
            success_style: self.success_style.clone(),
            scratch_root: self.scratch_root.clone(),
        }
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        let settings = FormatterSettings::default();
        Self {
            log_level: "info".to_string(),
            formatter: "email".to_string(),
            dry_run: false,
            recipients: vec![],
            notification_type: None,
            monitoring_url: None,
            success_style: settings.success_style,
            scratch_root: None,
            mail: MailConfig {
                from: "nagios@localhost".to_string(),
                transport: MailTransportKind::Smtp,
                smtp_host: "localhost".to_string(),
                smtp_port: 25,
                tls: MailTlsMode::Starttls,
                smtp_username: None,
                smtp_password: None,
                sendmail_command: None,
            },
            graphs: GraphsConfig {
                base_url: None,
                metrics: vec!["load_one".to_string(), "cpu_report".to_string()],
                range: "day".to_string(),
                timeout_seconds: 10,
            },
            inventory: InventoryConfig {
                provider: InventoryProvider::Knife,
                knife_command: "knife".to_string(),
                cluster_attribute: "ganglia.cluster_name".to_string(),
                clusters: HashMap::new(),
            },
        }
    }
}

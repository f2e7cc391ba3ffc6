//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `nagnotify.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Formats a monitoring alert and sends it by mail or pager.
///
/// Alert details are read from the NAGIOS_* environment variables exported by
/// the monitoring system for notification commands.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Formatter variant to use (e.g. email, pager, graph_email).
    #[arg(short, long, value_name = "NAME")]
    pub formatter: Option<String>,

    /// Notification type; defaults to $NAGIOS_NOTIFICATIONTYPE.
    #[arg(short, long, value_name = "TYPE")]
    pub notification_type: Option<String>,

    /// Comma-separated recipient addresses; defaults to the contact address.
    #[arg(short, long, value_name = "ADDR", value_delimiter = ',')]
    pub recipients: Vec<String>,

    /// Sender address.
    #[arg(long, value_name = "ADDR")]
    pub from: Option<String>,

    /// Print the message instead of sending it.
    #[arg(long)]
    pub dry_run: bool,

    /// Base URL of the monitoring web UI, used for links.
    #[arg(long, value_name = "URL")]
    pub monitoring_url: Option<String>,

    /// Base URL of the metrics front end used for graph attachments.
    #[arg(long, value_name = "URL")]
    pub graph_url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// List the available formatters and exit.
    #[arg(long)]
    pub list_formatters: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(formatter) = &self.formatter {
            dict.insert("formatter".into(), Value::from(formatter.clone()));
        }

        if let Some(kind) = &self.notification_type {
            dict.insert("notification_type".into(), Value::from(kind.clone()));
        }

        if !self.recipients.is_empty() {
            dict.insert("recipients".into(), Value::from(self.recipients.clone()));
        }

        // A flag can only switch dry-run on; leaving it out keeps whatever
        // the file or environment says.
        if self.dry_run {
            dict.insert("dry_run".into(), Value::from(true));
        }

        if let Some(url) = &self.monitoring_url {
            dict.insert("monitoring_url".into(), Value::from(url.clone()));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut mail = Dict::new();
        if let Some(from) = &self.from {
            mail.insert("from".into(), Value::from(from.clone()));
        }
        if !mail.is_empty() {
            dict.insert("mail".into(), Value::from(mail));
        }

        let mut graphs = Dict::new();
        if let Some(url) = &self.graph_url {
            graphs.insert("base_url".into(), Value::from(url.clone()));
        }
        if !graphs.is_empty() {
            dict.insert("graphs".into(), Value::from(graphs));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "nagnotify",
            "-f",
            "pager",
            "-n",
            "PROBLEM",
            "-r",
            "a@example.com,b@example.com",
            "--dry-run",
        ]);
        assert_eq!(cli.formatter.as_deref(), Some("pager"));
        assert_eq!(cli.notification_type.as_deref(), Some("PROBLEM"));
        assert_eq!(cli.recipients, vec!["a@example.com", "b@example.com"]);
        assert!(cli.dry_run);
        assert!(!cli.list_formatters);
    }

    #[test]
    fn test_provider_only_sets_given_values() {
        let cli = Cli {
            from: Some("alerts@example.com".to_string()),
            ..Default::default()
        };
        let data = cli.data().unwrap();
        let dict = &data[&Profile::Default];
        assert!(dict.contains_key("mail"));
        assert!(!dict.contains_key("formatter"));
        assert!(!dict.contains_key("dry_run"));
        assert!(!dict.contains_key("graphs"));
    }
}

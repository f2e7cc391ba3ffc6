use nagnotify::cli::Cli;
use nagnotify::config::{Config, InventoryProvider, MailTlsMode, MailTransportKind};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        formatter = "graph_email"
        dry_run = true
        recipients = ["ops@example.com", "noc@example.com"]
        monitoring_url = "https://nagios.example.com/nagios/"
        scratch_root = "/var/tmp/nagnotify"
        [mail]
        from = "Nagios <nagios@example.com>"
        transport = "sendmail"
        sendmail_command = "/usr/sbin/sendmail"
        tls = "wrapper"
        [graphs]
        base_url = "https://ganglia.example.com/ganglia"
        metrics = ["load_one"]
        range = "hour"
        [inventory]
        provider = "static"
        [inventory.clusters]
        web01 = "web"
    "#;

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.formatter, "graph_email");
    assert!(config.dry_run);
    assert_eq!(config.recipients, vec!["ops@example.com", "noc@example.com"]);
    assert_eq!(
        config.monitoring_url.as_deref(),
        Some("https://nagios.example.com/nagios/")
    );
    assert_eq!(config.scratch_root, Some(PathBuf::from("/var/tmp/nagnotify")));
    assert_eq!(config.mail.from, "Nagios <nagios@example.com>");
    assert_eq!(config.mail.transport, MailTransportKind::Sendmail);
    assert_eq!(config.mail.sendmail_command.as_deref(), Some("/usr/sbin/sendmail"));
    assert_eq!(config.mail.tls, MailTlsMode::Wrapper);
    assert_eq!(config.mail.smtp_port, 25); // Not in the toml, so the default value
    assert_eq!(
        config.graphs.base_url.as_deref(),
        Some("https://ganglia.example.com/ganglia")
    );
    assert_eq!(config.graphs.metrics, vec!["load_one"]);
    assert_eq!(config.graphs.range, "hour");
    assert_eq!(config.graphs.timeout_seconds, 10);
    assert_eq!(config.inventory.provider, InventoryProvider::Static);
    assert_eq!(config.inventory.clusters.get("web01").map(String::as_str), Some("web"));
}

#[test]
fn test_load_partial_config_uses_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "formatter = \"pager\"\n").unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();

    let default = Config::default();
    assert_eq!(config.formatter, "pager");
    assert_eq!(config.mail, default.mail);
    assert_eq!(config.graphs, default.graphs);
    assert_eq!(config.inventory, default.inventory);
    assert_eq!(config.success_style, "color: #008000;");
}

#[test]
fn test_cli_overrides_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        formatter = "email"
        recipients = ["ops@example.com"]
        [mail]
        from = "nagios@example.com"
        [graphs]
        base_url = "http://file.example.com"
        "#
    )
    .unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        formatter: Some("pager".to_string()),
        recipients: vec!["oncall@example.com".to_string()],
        from: Some("alerts@example.com".to_string()),
        graph_url: Some("http://cli.example.com".to_string()),
        notification_type: Some("RECOVERY".to_string()),
        dry_run: true,
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.formatter, "pager");
    assert_eq!(config.recipients, vec!["oncall@example.com"]);
    assert_eq!(config.mail.from, "alerts@example.com");
    assert_eq!(config.mail.transport, MailTransportKind::Smtp);
    assert_eq!(config.mail.tls, MailTlsMode::Starttls);
    assert_eq!(config.graphs.base_url.as_deref(), Some("http://cli.example.com"));
    assert_eq!(config.notification_type.as_deref(), Some("RECOVERY"));
    assert!(config.dry_run);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let cli = Cli {
        config: Some(PathBuf::from("/nonexistent/nagnotify.toml")),
        ..Default::default()
    };
    let err = Config::load(&cli).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/nagnotify.toml"));
}

#[test]
fn test_invalid_transport_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[mail]\ntransport = \"carrier-pigeon\"\n").unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(Config::load(&cli).is_err());
}

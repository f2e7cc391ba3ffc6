//! nagnotify - formats a monitoring alert and sends it by mail or pager.
//!
//! Intended to be wired up as a notification command; the alert itself is
//! read from the NAGIOS_* environment variables.

use anyhow::Result;
use clap::Parser;
use nagnotify::{
    app::Notifier,
    cli::Cli,
    config::Config,
    context::EnvSource,
    error::NotifyError,
    formatting::FormatterRegistry,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_formatters {
        let registry = FormatterRegistry::builtin()?;
        for variant in registry.iter() {
            println!("{:<12} {}", variant.name, variant.description);
        }
        return Ok(());
    }

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        init_logging("error");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(2);
    });

    init_logging(&config.log_level);
    debug!(
        formatter = %config.formatter,
        dry_run = config.dry_run,
        graphs = config.graphs.base_url.is_some(),
        "Configuration loaded"
    );

    let result = Notifier::builder(config)
        .build()
        .and_then(|notifier| notifier.run(&EnvSource, &mut std::io::stdout().lock()));

    match result {
        Ok(outcome) => {
            info!(?outcome, "Notification finished");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "Notification failed");
            std::process::exit(exit_code(&err));
        }
    }
}

fn exit_code(err: &NotifyError) -> i32 {
    if err.is_configuration() {
        2
    } else {
        1
    }
}

//! One notification run, decoupled from the entry point.

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::{Config, InventoryProvider};
use crate::context::NotificationContext;
use crate::core::{ImageDownloader, InventoryLookup, MailDelivery, VariableSource};
use crate::error::Result;
use crate::formatting::{Formatter, FormatterRegistry, FormatterSettings};
use crate::graphs::{GraphFetcher, HttpDownloader, KnifeInventory, StaticInventory};
use crate::notification::{self, Mailer, SendOutcome};

/// Formats and sends a single alert according to the loaded configuration.
pub struct Notifier {
    config: Config,
    settings: FormatterSettings,
    registry: FormatterRegistry,
    inventory: Box<dyn InventoryLookup>,
    downloader: Box<dyn ImageDownloader>,
    mailer: Box<dyn MailDelivery>,
}

impl Notifier {
    /// Creates a new `NotifierBuilder` to construct a `Notifier`.
    pub fn builder(config: Config) -> NotifierBuilder {
        NotifierBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    /// Reads the alert from `source`, renders it with the configured
    /// formatter and sends it, printing to `out` in dry-run mode.
    #[instrument(skip_all, fields(formatter = %self.config.formatter))]
    pub fn run(&self, source: &dyn VariableSource, out: &mut dyn Write) -> Result<SendOutcome> {
        let variant = self.registry.lookup(&self.config.formatter)?;
        let context = NotificationContext::from_source(source);

        let notification_type = self
            .config
            .notification_type
            .clone()
            .unwrap_or_else(|| context.notification_type.clone());

        let mut formatter = Formatter::new(variant, &context, &self.settings);
        let kind = formatter.generate_content(&notification_type)?;

        if variant.attach_graphs {
            self.attach_graphs(&mut formatter, &context.hostname);
        }

        let recipients = if self.config.recipients.is_empty() {
            context.contact_for(variant.message_type)
        } else {
            self.config.recipients.clone()
        };
        // A dry run still prints, so the rendering can be previewed without
        // a contact address.
        if recipients.is_empty() && !self.config.dry_run {
            info!(
                target_name = %context.target(),
                channel = %variant.message_type,
                "No recipients for notification, nothing sent"
            );
            return Ok(SendOutcome::Skipped);
        }

        let message = formatter.build_message(
            kind,
            &self.config.mail.from,
            recipients,
            self.config.dry_run,
        );
        let outcome = notification::send(&message, self.mailer.as_ref(), out)?;
        formatter.cleanup();
        Ok(outcome)
    }

    /// Downloads the configured graphs for `host` and attaches them. Any
    /// failure here only costs the attachments, never the notification.
    fn attach_graphs(&self, formatter: &mut Formatter<'_>, host: &str) {
        let graphs = &self.config.graphs;
        let Some(base_url) = graphs.base_url.as_deref() else {
            debug!("No graph URL configured, skipping graphs");
            return;
        };
        if host.is_empty() || graphs.metrics.is_empty() {
            return;
        }

        let dest = match formatter.scratch_dir() {
            Ok(dir) => dir.to_path_buf(),
            Err(e) => {
                warn!(
                    host = %host,
                    error = %e,
                    "Cannot create scratch directory, sending without graphs"
                );
                return;
            }
        };
        let fetcher =
            GraphFetcher::new(base_url, self.inventory.as_ref(), self.downloader.as_ref());
        for metric in &graphs.metrics {
            for path in fetcher.fetch_graphs(&[host], metric, &dest, &graphs.range) {
                formatter.attach(path);
            }
        }
    }
}

/// Builder for [`Notifier`].
///
/// Every collaborator defaults to the real implementation described by the
/// configuration and can be replaced, which is how the tests run without a
/// mail server, a Chef server or a metrics front end.
pub struct NotifierBuilder {
    config: Config,
    registry: Option<FormatterRegistry>,
    inventory: Option<Box<dyn InventoryLookup>>,
    downloader: Option<Box<dyn ImageDownloader>>,
    mailer: Option<Box<dyn MailDelivery>>,
}

impl NotifierBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: None,
            inventory: None,
            downloader: None,
            mailer: None,
        }
    }

    pub fn registry(mut self, registry: FormatterRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn inventory(mut self, inventory: Box<dyn InventoryLookup>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn downloader(mut self, downloader: Box<dyn ImageDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn mailer(mut self, mailer: Box<dyn MailDelivery>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn build(self) -> Result<Notifier> {
        let config = self.config;

        let inventory: Box<dyn InventoryLookup> = match self.inventory {
            Some(inventory) => inventory,
            None => match config.inventory.provider {
                InventoryProvider::Knife => Box::new(KnifeInventory::new(
                    config.inventory.knife_command.clone(),
                    config.inventory.cluster_attribute.clone(),
                )),
                InventoryProvider::Static => {
                    Box::new(StaticInventory::new(config.inventory.clusters.clone()))
                }
            },
        };

        let downloader: Box<dyn ImageDownloader> = match self.downloader {
            Some(downloader) => downloader,
            None => Box::new(HttpDownloader::new(Duration::from_secs(
                config.graphs.timeout_seconds,
            ))?),
        };

        let mailer: Box<dyn MailDelivery> = match self.mailer {
            Some(mailer) => mailer,
            None => Box::new(Mailer::from_config(&config.mail)?),
        };

        let registry = match self.registry {
            Some(registry) => registry,
            None => FormatterRegistry::builtin()?,
        };

        Ok(Notifier {
            settings: config.formatter_settings(),
            registry,
            config,
            inventory,
            downloader,
            mailer,
        })
    }
}

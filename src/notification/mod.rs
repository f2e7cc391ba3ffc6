//! Delivery of assembled notifications.
//!
//! A [`Message`] is either printed to the console (dry run) or handed to a
//! [`MailDelivery`] implementation. Delivery errors are passed back to the
//! caller untouched; nothing here retries.

pub mod mail;

use std::io::Write;
use std::path::PathBuf;

use tracing::{info, instrument};

use crate::core::MailDelivery;
use crate::error::Result;

pub use mail::Mailer;

const DIVIDER: &str =
    "========================================================================";

/// One outgoing notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub recipients: Vec<String>,
    pub from: String,
    pub subject: String,
    pub text: String,
    /// Full HTML document, for channels that support it.
    pub html: Option<String>,
    pub attachments: Vec<PathBuf>,
    /// Print instead of delivering.
    pub dry_run: bool,
}

/// What happened to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Printed,
    /// Nothing was sent because no recipient could be determined.
    Skipped,
}

/// Sends `message` through `mailer`, or prints it to `out` in dry-run mode.
#[instrument(
    skip_all,
    fields(
        subject = %message.subject,
        recipients = message.recipients.len(),
        dry_run = message.dry_run
    )
)]
pub fn send(
    message: &Message,
    mailer: &dyn MailDelivery,
    out: &mut dyn Write,
) -> Result<SendOutcome> {
    if message.dry_run {
        print_message(message, out)?;
        info!("Dry run, message printed instead of sent");
        return Ok(SendOutcome::Printed);
    }

    mailer.deliver(message)?;
    info!("Message delivered");
    Ok(SendOutcome::Delivered)
}

/// Writes a human-readable rendering of `message`.
pub fn print_message(message: &Message, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{DIVIDER}")?;
    writeln!(out, "Subject: {}", message.subject)?;
    writeln!(out, "{DIVIDER}")?;
    writeln!(out, "To: {}", message.recipients.join(", "))?;
    writeln!(out, "From: {}", message.from)?;
    for attachment in &message.attachments {
        writeln!(out, "Attachment: {}", attachment.display())?;
    }
    writeln!(out)?;
    write!(out, "{}", message.text)?;
    out.flush()
}

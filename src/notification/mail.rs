//! Mail delivery through lettre.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{SendmailTransport, SmtpTransport, Transport};
use tracing::{debug, instrument};

use super::Message;
use crate::config::{MailConfig, MailTlsMode, MailTransportKind};
use crate::core::MailDelivery;
use crate::error::{NotifyError, Result};

enum Backend {
    Smtp(SmtpTransport),
    Sendmail(SendmailTransport),
}

/// Delivers messages over SMTP or through a local sendmail binary.
pub struct Mailer {
    backend: Backend,
}

impl Mailer {
    /// Builds the transport described by `config`. The sender address is
    /// validated up front so a bad `from` fails before any content is built.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        parse_mailbox(&config.from)?;
        let backend = match config.transport {
            MailTransportKind::Smtp => Backend::Smtp(smtp_transport(config)?),
            MailTransportKind::Sendmail => Backend::Sendmail(match &config.sendmail_command {
                Some(command) => SendmailTransport::new_with_command(command),
                None => SendmailTransport::new(),
            }),
        };
        Ok(Self { backend })
    }
}

fn smtp_transport(config: &MailConfig) -> Result<SmtpTransport> {
    let host = config.smtp_host.as_str();
    let builder = match config.tls {
        MailTlsMode::None => SmtpTransport::builder_dangerous(host),
        MailTlsMode::Starttls => SmtpTransport::builder_dangerous(host)
            .tls(Tls::Required(TlsParameters::new(host.to_string())?)),
        MailTlsMode::Wrapper => SmtpTransport::builder_dangerous(host)
            .tls(Tls::Wrapper(TlsParameters::new(host.to_string())?)),
    };
    let mut builder = builder.port(config.smtp_port);

    match (&config.smtp_username, &config.smtp_password) {
        (Some(_), Some(_)) if config.tls == MailTlsMode::None => {
            return Err(NotifyError::PlaintextCredentials);
        }
        (Some(user), Some(pass)) => {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        _ => {}
    }
    debug!(host, port = config.smtp_port, tls = ?config.tls, "SMTP transport configured");
    Ok(builder.build())
}

impl MailDelivery for Mailer {
    #[instrument(skip_all, fields(recipients = message.recipients.len()))]
    fn deliver(&self, message: &Message) -> Result<()> {
        let email = build_email(message)?;
        match &self.backend {
            Backend::Smtp(transport) => transport
                .send(&email)
                .map(|response| debug!(code = %response.code(), "SMTP server accepted message"))
                .map_err(|e| NotifyError::Delivery(Box::new(e))),
            Backend::Sendmail(transport) => transport
                .send(&email)
                .map_err(|e| NotifyError::Delivery(Box::new(e))),
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|source| NotifyError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

/// Converts a [`Message`] into a MIME email: plain text alone, or
/// `multipart/alternative` text + HTML wrapped in `multipart/mixed` with any
/// image attachments.
pub fn build_email(message: &Message) -> Result<lettre::Message> {
    let mut builder = lettre::Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.as_str());
    for recipient in &message.recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    let Some(html) = &message.html else {
        return Ok(builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.text.clone())?);
    };

    let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
        message.text.clone(),
        html.clone(),
    ));
    for path in &message.attachments {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "graph.png".to_string());
        let bytes = std::fs::read(path)?;
        body = body.singlepart(attachment(filename, bytes));
    }
    Ok(builder.multipart(body)?)
}

fn attachment(filename: String, bytes: Vec<u8>) -> SinglePart {
    let mime = if filename.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    };
    let content_type = ContentType::parse(mime).unwrap_or(ContentType::TEXT_PLAIN);
    Attachment::new(filename).body(bytes, content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn message() -> Message {
        Message {
            recipients: vec![
                "ops@example.com".to_string(),
                "Dev Team <dev@example.com>".to_string(),
            ],
            from: "Nagios <nagios@example.com>".to_string(),
            subject: "** PROBLEM Host web01 is DOWN **".to_string(),
            text: "Host: web01 \n\n".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_text_email() {
        let email = build_email(&message()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Subject: ** PROBLEM Host web01 is DOWN **"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("<dev@example.com>"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(!raw.contains("multipart"));
    }

    #[test]
    fn test_html_email_with_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("web01-load_one.png");
        let mut file = std::fs::File::create(&graph).unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\n").unwrap();

        let mut msg = message();
        msg.html = Some("<html><body><b>Host:</b> web01</body></html>".to_string());
        msg.attachments = vec![graph];

        let raw = String::from_utf8(build_email(&msg).unwrap().formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Content-Type: image/png"));
        assert!(raw.contains("filename=\"web01-load_one.png\""));
    }

    #[test]
    fn test_invalid_recipient_is_reported() {
        let mut msg = message();
        msg.recipients = vec!["not an address".to_string()];
        let err = build_email(&msg).unwrap_err();
        assert!(matches!(
            err,
            NotifyError::InvalidAddress { address, .. } if address == "not an address"
        ));
    }

    #[test]
    fn test_missing_attachment_is_an_io_error() {
        let mut msg = message();
        msg.html = Some("<p>x</p>".to_string());
        msg.attachments = vec!["/nonexistent/web01-load_one.png".into()];
        assert!(matches!(build_email(&msg), Err(NotifyError::Io(_))));
    }

    fn smtp_config(tls: MailTlsMode) -> MailConfig {
        MailConfig {
            tls,
            ..crate::config::Config::default().mail
        }
    }

    #[test]
    fn test_smtp_transport_for_each_tls_mode() {
        for tls in [MailTlsMode::None, MailTlsMode::Starttls, MailTlsMode::Wrapper] {
            assert!(Mailer::from_config(&smtp_config(tls)).is_ok(), "{tls:?}");
        }
    }

    #[test]
    fn test_credentials_require_tls() {
        let mut config = smtp_config(MailTlsMode::None);
        config.smtp_username = Some("nagios".to_string());
        config.smtp_password = Some("secret".to_string());
        let err = Mailer::from_config(&config).err().unwrap();
        assert!(matches!(err, NotifyError::PlaintextCredentials));
        assert!(err.is_configuration());

        config.tls = MailTlsMode::Starttls;
        assert!(Mailer::from_config(&config).is_ok());
    }
}

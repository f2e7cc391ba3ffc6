//! Crate-level error type.

use thiserror::Error;

use crate::graphs::GraphError;

/// Errors that can abort a notification run.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The notification type is not one the selected formatter can render.
    #[error("unknown notification type '{0}'")]
    UnknownNotificationType(String),

    /// No formatter variant is registered under the requested name.
    #[error("unknown formatter '{name}' (available: {available})")]
    UnknownFormatter { name: String, available: String },

    /// A formatter variant was registered twice under the same name.
    #[error("formatter '{0}' is already registered")]
    DuplicateFormatter(String),

    /// A sender or recipient address could not be parsed.
    #[error("invalid mail address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The SMTP transport could not be set up (e.g. TLS parameters).
    #[error("invalid SMTP transport configuration: {0}")]
    MailTransport(#[from] lettre::transport::smtp::Error),

    /// SMTP credentials were configured for an unencrypted connection.
    #[error("refusing to send SMTP credentials without TLS (set mail.tls to starttls or wrapper)")]
    PlaintextCredentials,

    /// The mail message could not be assembled.
    #[error("failed to build mail message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// The mail transport rejected or failed to deliver the message.
    #[error("mail delivery failed: {0}")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("graph fetch failed: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NotifyError {
    /// Returns `true` for errors caused by how the command was invoked or
    /// configured, as opposed to a runtime failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NotifyError::UnknownNotificationType(_)
                | NotifyError::UnknownFormatter { .. }
                | NotifyError::DuplicateFormatter(_)
                | NotifyError::InvalidAddress { .. }
                | NotifyError::MailTransport(_)
                | NotifyError::PlaintextCredentials
        )
    }
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

//! In-process fakes for the external services, shared by the integration
//! tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

use crate::core::{ImageDownloader, MailDelivery};
use crate::error::Result;
use crate::graphs::GraphError;
use crate::notification::Message;

/// An [`ImageDownloader`] that writes a tiny PNG header instead of making a
/// request. URLs whose `h=` query value is in `failing_hosts` answer 500.
#[derive(Debug, Default)]
pub struct FakeDownloader {
    failing_hosts: HashSet<String>,
    requests: RefCell<Vec<String>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, host: &str) -> Self {
        self.failing_hosts.insert(host.to_string());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ImageDownloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> std::result::Result<(), GraphError> {
        self.requests.borrow_mut().push(url.to_string());
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.query_pairs().find(|(k, _)| k == "h").map(|(_, v)| v.into_owned()))
            .unwrap_or_default();
        if self.failing_hosts.contains(&host) {
            return Err(GraphError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        std::fs::write(dest, b"\x89PNG\r\n\x1a\n")?;
        Ok(())
    }
}

/// A [`MailDelivery`] that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: RefCell<Vec<Message>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.borrow().clone()
    }
}

impl MailDelivery for RecordingMailer {
    fn deliver(&self, message: &Message) -> Result<()> {
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

// Lets a test keep a handle on a fake after boxing it into a `Notifier`.
impl<T: ImageDownloader + ?Sized> ImageDownloader for std::rc::Rc<T> {
    fn download(&self, url: &str, dest: &Path) -> std::result::Result<(), GraphError> {
        (**self).download(url, dest)
    }
}

impl<T: MailDelivery + ?Sized> MailDelivery for std::rc::Rc<T> {
    fn deliver(&self, message: &Message) -> Result<()> {
        (**self).deliver(message)
    }
}

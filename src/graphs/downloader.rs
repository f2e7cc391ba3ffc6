//! Blocking HTTP image download.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use super::GraphError;
use crate::core::ImageDownloader;

/// Downloads graph images over HTTP(S).
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self, GraphError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ImageDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), GraphError> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes()?;
        std::fs::write(dest, &body)?;
        debug!(url = %url, bytes = body.len(), dest = %dest.display(), "Saved graph image");
        Ok(())
    }
}

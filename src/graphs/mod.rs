//! Metric graph attachments.
//!
//! For each host the helper asks the inventory which metrics cluster the host
//! reports into, builds the graph URL of the metrics front end and downloads
//! the image. Failures are logged and skipped so a broken graph never blocks
//! the notification itself.

pub mod downloader;
pub mod inventory;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::core::{ImageDownloader, InventoryLookup};

pub use downloader::HttpDownloader;
pub use inventory::{KnifeInventory, StaticInventory};

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("no inventory node matches host '{0}'")]
    NotFound(String),

    #[error("inventory node for host '{0}' has no cluster attribute")]
    NoCluster(String),

    #[error("inventory query failed: {0}")]
    Query(String),
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("invalid graph URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("graph request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to write graph image: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the graph image URL for one host and metric.
///
/// # Examples
///
/// ```
/// use nagnotify::graphs::graph_url;
///
/// let base = "https://ganglia.example.com/ganglia/";
/// let url = graph_url(base, "web", "web01", "load_one", "day").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://ganglia.example.com/ganglia/graph.php?c=web&h=web01&m=load_one&r=day&z=large"
/// );
/// ```
pub fn graph_url(
    base: &str,
    cluster: &str,
    host: &str,
    metric: &str,
    range: &str,
) -> Result<Url, GraphError> {
    let raw = format!("{}/graph.php", base.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|source| GraphError::InvalidUrl { url: raw, source })?;
    url.query_pairs_mut()
        .append_pair("c", cluster)
        .append_pair("h", host)
        .append_pair("m", metric)
        .append_pair("r", range)
        .append_pair("z", "large");
    Ok(url)
}

/// Strips trailing path separators, leaving a bare root untouched.
pub fn normalize_dir(dir: &Path) -> PathBuf {
    let raw = dir.to_string_lossy();
    let trimmed = raw.trim_end_matches(std::path::is_separator);
    if trimmed.is_empty() {
        dir.to_path_buf()
    } else {
        PathBuf::from(trimmed)
    }
}

/// Downloads graphs through an inventory and an image downloader.
pub struct GraphFetcher<'a> {
    base_url: String,
    inventory: &'a dyn InventoryLookup,
    downloader: &'a dyn ImageDownloader,
}

impl<'a> GraphFetcher<'a> {
    pub fn new(
        base_url: impl Into<String>,
        inventory: &'a dyn InventoryLookup,
        downloader: &'a dyn ImageDownloader,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            inventory,
            downloader,
        }
    }

    /// Fetches `metric` for every host into `dest_dir/<host>-<metric>.png`.
    ///
    /// Returns the paths that were written, in host order. A host whose
    /// cluster cannot be resolved or whose image cannot be downloaded is
    /// logged and left out.
    #[instrument(skip(self, hosts, dest_dir), fields(hosts = hosts.len()))]
    pub fn fetch_graphs<S: AsRef<str>>(
        &self,
        hosts: &[S],
        metric: &str,
        dest_dir: &Path,
        range: &str,
    ) -> Vec<PathBuf> {
        let dest_dir = normalize_dir(dest_dir);
        let mut fetched = Vec::with_capacity(hosts.len());

        for host in hosts.iter().map(AsRef::as_ref) {
            match self.fetch_one(host, metric, &dest_dir, range) {
                Ok(path) => {
                    debug!(host = %host, path = %path.display(), "Fetched graph");
                    fetched.push(path);
                }
                Err(e) => {
                    warn!(host = %host, metric = %metric, error = %e, "Failed to fetch graph")
                }
            }
        }

        info!(fetched = fetched.len(), "Graph fetch finished");
        fetched
    }

    fn fetch_one(
        &self,
        host: &str,
        metric: &str,
        dest_dir: &Path,
        range: &str,
    ) -> Result<PathBuf, GraphError> {
        let cluster = self.inventory.cluster_for(host)?;
        let url = graph_url(&self.base_url, &cluster, host, metric, range)?;
        let dest = dest_dir.join(format!("{host}-{metric}.png"));
        self.downloader.download(url.as_str(), &dest)?;
        Ok(dest)
    }
}

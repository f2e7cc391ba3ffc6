//! Host → metrics cluster lookups.

use std::collections::HashMap;
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use super::InventoryError;
use crate::core::InventoryLookup;

/// Looks hosts up in a Chef server through `knife search node`.
#[derive(Debug, Clone)]
pub struct KnifeInventory {
    command: String,
    attribute: String,
}

impl KnifeInventory {
    /// # Arguments
    /// * `command` - The knife executable to run.
    /// * `attribute` - The dotted node attribute holding the cluster name
    ///   (e.g. `ganglia.cluster_name`).
    pub fn new(command: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            attribute: attribute.into(),
        }
    }
}

impl InventoryLookup for KnifeInventory {
    fn cluster_for(&self, host: &str) -> Result<String, InventoryError> {
        let query = format!("name:{host}");
        debug!(command = %self.command, query = %query, "Querying inventory");
        let output = Command::new(&self.command)
            .args(["search", "node", query.as_str(), "-a", self.attribute.as_str(), "-F", "json"])
            .output()
            .map_err(|e| InventoryError::Query(format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InventoryError::Query(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        parse_search_output(host, &self.attribute, &output.stdout)
    }
}

/// Extracts `attribute` from the first row of `knife search -F json` output.
///
/// Rows come in two shapes depending on the knife version: keyed by node
/// name (`{"web01": {"attr": "x"}}`) or flat (`{"name": "web01", "attr": "x"}`).
fn parse_search_output(
    host: &str,
    attribute: &str,
    stdout: &[u8],
) -> Result<String, InventoryError> {
    let doc: Value = serde_json::from_slice(stdout)
        .map_err(|e| InventoryError::Query(format!("unreadable search output: {e}")))?;

    let row = doc
        .get("rows")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .ok_or_else(|| InventoryError::NotFound(host.to_string()))?;

    let node = match row.get(attribute) {
        Some(_) => row,
        None => row
            .as_object()
            .and_then(|map| map.values().next())
            .unwrap_or(row),
    };

    node.get(attribute)
        .and_then(Value::as_str)
        .filter(|cluster| !cluster.is_empty())
        .map(String::from)
        .ok_or_else(|| InventoryError::NoCluster(host.to_string()))
}

/// A fixed host → cluster table, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    clusters: HashMap<String, String>,
}

impl StaticInventory {
    pub fn new(clusters: HashMap<String, String>) -> Self {
        Self { clusters }
    }
}

impl InventoryLookup for StaticInventory {
    fn cluster_for(&self, host: &str) -> Result<String, InventoryError> {
        self.clusters
            .get(host)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(host.to_string()))
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{ConvpageError, Result};

/// A raw archive node that carries a timestamped message.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedNode {
    pub node_id: String,
    pub create_time: f64,
    pub node: Value,
}

/// Nodes keyed by UTC calendar date (`YYYY-MM-DD`), each group in time order.
pub type DateGroups = BTreeMap<String, Vec<DatedNode>>;

pub fn group_nodes_by_date(archive: &Value) -> DateGroups {
    let mut groups = DateGroups::new();

    for conversation in archive.as_array().into_iter().flatten() {
        let Some(mapping) = conversation.get("mapping").and_then(Value::as_object) else {
            continue;
        };

        for (node_id, node) in mapping {
            let Some(create_time) = node
                .get("message")
                .and_then(|message| message.get("create_time"))
                .and_then(Value::as_f64)
            else {
                continue;
            };
            let Some(date) = utc_date(create_time) else {
                tracing::debug!(node_id = %node_id, create_time, "timestamp out of range");
                continue;
            };

            groups.entry(date).or_default().push(DatedNode {
                node_id: node_id.clone(),
                create_time,
                node: node.clone(),
            });
        }
    }

    for nodes in groups.values_mut() {
        nodes.sort_by(|left, right| {
            left.create_time
                .total_cmp(&right.create_time)
                .then_with(|| left.node_id.cmp(&right.node_id))
        });
    }

    groups
}

/// The earliest node id for every date.
pub fn first_node_per_date(archive: &Value) -> BTreeMap<String, String> {
    group_nodes_by_date(archive)
        .into_iter()
        .filter_map(|(date, nodes)| {
            let first = nodes.into_iter().next()?;
            Some((date, first.node_id))
        })
        .collect()
}

/// Writes one pretty-printed `messages_<date>.json` per date into `dir`.
pub fn write_nodes_by_date(archive: &Value, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| ConvpageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for (date, nodes) in group_nodes_by_date(archive) {
        let payload = nodes.into_iter().map(|dated| dated.node).collect::<Vec<_>>();
        let raw = serde_json::to_string_pretty(&payload)
            .map_err(|err| ConvpageError::Serialization(err.to_string()))?;

        let path = dir.join(format!("messages_{date}.json"));
        fs::write(&path, raw).map_err(|source| ConvpageError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    tracing::info!(dir = %dir.display(), files = written.len(), "split archive by date");
    Ok(written)
}

fn utc_date(seconds: f64) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    let millis = (seconds * 1000.0).round() as i64;
    let time = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(time.format("%Y-%m-%d").to_string())
}

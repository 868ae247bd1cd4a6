//! Best-effort parsing of the node dataset.
//!
//! The dataset is a JSON array of node objects. Only a syntactically broken
//! document is an error; a well-formed document with an unexpected shape
//! degrades to fewer (or zero) markers.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{MapError, Result};
use crate::models::Node;

/// Parse the dataset text into nodes, preserving dataset order.
pub fn parse_nodes(text: &str) -> Result<Vec<Node>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| MapError::DatasetLoadFailure(format!("invalid JSON: {e}")))?;
    Ok(nodes_from_value(value))
}

/// Convert an already-decoded JSON value into nodes.
pub fn nodes_from_value(value: Value) -> Vec<Node> {
    let Value::Array(items) = value else {
        warn!("Node dataset is not an array; showing an empty map");
        return Vec::new();
    };

    if let Some(first) = items.first() {
        if !looks_like_node(first) {
            warn!("Node structure may be invalid");
        }
    }

    let total = items.len();
    let nodes: Vec<Node> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<Node>(item) {
            Ok(node) => Some(node),
            Err(e) => {
                debug!(index = i, error = %e, "Skipping unreadable node entry");
                None
            }
        })
        .collect();

    info!(nodes = nodes.len(), entries = total, "Loaded {} nodes", nodes.len());
    nodes
}

/// Presence check used on the first element only.
fn looks_like_node(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => obj.contains_key("x") && obj.contains_key("y") && obj.contains_key("name"),
        None => false,
    }
}

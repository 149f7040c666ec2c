//! Node annotation.

use tracing::{debug, warn};

use crate::capture::ErrorRecord;
use crate::editor::GraphNode;

/// Record `record` against `node` and attach the one-time error marker.
///
/// Returns `true` when the marker was newly attached. A node that already
/// carries the marker only gets its stored error refreshed, so repeated errors
/// on the same node never stack markers.
pub fn annotate_node(node: &GraphNode, record: &ErrorRecord) -> bool {
    if let Err(e) = node.store_error(record) {
        warn!(node_id = %node.id(), error = %e, "failed to store error on node");
    }
    if node.has_error_marker() {
        debug!(node_id = %node.id(), "node already marked, updated stored error only");
        return false;
    }
    match node.set_error_marker() {
        Ok(()) => {
            debug!(node_id = %node.id(), "attached error marker");
            true
        }
        Err(e) => {
            warn!(node_id = %node.id(), error = %e, "failed to attach error marker");
            false
        }
    }
}

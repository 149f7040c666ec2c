//! Host-editor boundary.
//!
//! Everything the crate needs from the graph editor goes through these traits.
//! The editor owns its canvas, nodes, and dialogs; this module only defines
//! the seam.

use async_trait::async_trait;

use crate::capture::ErrorRecord;
use crate::errors::FixerError;

/// Live connection to the hosting graph editor.
#[async_trait]
pub trait GraphEditorEngine: Send + Sync {
    /// Look up a live node handle by the editor's node id.
    async fn node(&self, node_id: &str) -> Result<GraphNode, FixerError>;

    /// Serialize the current workflow graph.
    async fn serialize_workflow(&self) -> Result<String, FixerError>;

    /// Open a URL in a new browser context.
    async fn open_url(&self, url: &str) -> Result<(), FixerError>;

    /// Ask the editor to repaint its canvas.
    async fn request_redraw(&self) -> Result<(), FixerError>;
}

/// A live node in the editor's graph.
#[derive(Debug)]
pub struct GraphNode {
    inner: Box<dyn NodeHandle>,
}

impl GraphNode {
    pub fn new(inner: Box<dyn NodeHandle>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> String {
        self.inner.id()
    }

    pub fn node_type(&self) -> Option<String> {
        self.inner.node_type()
    }

    pub fn has_error_marker(&self) -> bool {
        self.inner.has_error_marker()
    }

    pub fn set_error_marker(&self) -> Result<(), FixerError> {
        self.inner.set_error_marker()
    }

    pub fn store_error(&self, record: &ErrorRecord) -> Result<(), FixerError> {
        self.inner.store_error(record)
    }
}

/// Backing implementation of a node handle, provided by the engine.
pub trait NodeHandle: std::fmt::Debug + Send + Sync {
    fn id(&self) -> String;

    fn node_type(&self) -> Option<String>;

    /// Whether the one-time error marker is already attached. This flag is the
    /// idempotence contract for annotation.
    fn has_error_marker(&self) -> bool;

    /// Attach the visual error marker to the node's rendering.
    fn set_error_marker(&self) -> Result<(), FixerError>;

    /// Record the error against the node for later retrieval by the host,
    /// e.g. when the marker is clicked.
    fn store_error(&self, record: &ErrorRecord) -> Result<(), FixerError>;
}

/// A host callback slot, as stored on the editor's objects.
pub type HostHandler<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Compose a host handler with a triage action that runs first.
///
/// The host exposes callback slots (draw, input) that may already be occupied.
/// Instead of patching in place, the caller takes the existing handler out,
/// wraps it here, and installs the result back into the slot. The original
/// handler still runs on every invocation.
pub fn chain_handler<T: 'static>(
    action: impl Fn(&T) + Send + Sync + 'static,
    inner: Option<HostHandler<T>>,
) -> HostHandler<T> {
    Box::new(move |arg| {
        action(arg);
        if let Some(inner) = &inner {
            inner(arg);
        }
    })
}

//! Execution-error triage for node-graph editors
//!
//! This crate watches a node-graph editor for execution errors, correlates the
//! structured error events the editor pushes with the error dialogs its UI
//! shows later, and produces a bug-triage link plus a per-node error marker.
//! The editor itself stays external: every interaction with it goes through
//! the traits in [`editor`], and dialog discovery runs over UI snapshots the
//! frontend ships across the [`bridge`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

pub mod annotate;
pub mod bridge;
pub mod capture;
pub mod discovery;
pub mod editor;
pub mod errors;
pub mod launcher;
pub mod sanitize;

pub use bridge::EditorBridge;
pub use capture::{ErrorCorrelator, ErrorRecord, ErrorSource, ExecutionErrorEvent};
pub use discovery::{AnchorButtonDiscovery, DialogDiscovery, UiNode};
pub use editor::{GraphEditorEngine, GraphNode, NodeHandle};
pub use errors::FixerError;
pub use launcher::FixPageLauncher;
pub use sanitize::ScrapeFilter;

/// Tunables for a [`Fixer`] instance.
#[derive(Debug, Clone)]
pub struct FixerConfig {
    /// Maximum age of a captured execution event before a dialog query falls
    /// back to scraped text, in milliseconds.
    pub freshness_window_ms: u64,
    /// Bug-triage endpoint fix links point at.
    pub triage_base_url: String,
    /// Captions of the report button the editor renders in its error dialog.
    pub anchor_labels: Vec<String>,
    /// Dialog container classes recognized by the default discovery strategy.
    pub dialog_classes: Vec<String>,
    /// Subtrees and captions dropped while scraping dialog text.
    pub scrape_filter: ScrapeFilter,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: 5_000,
            triage_base_url: launcher::DEFAULT_TRIAGE_URL.to_string(),
            anchor_labels: vec!["Show Report".to_string(), "显示报告".to_string()],
            dialog_classes: vec![
                "litemodal-dialog".to_string(),
                "comfy-modal".to_string(),
                "p-dialog".to_string(),
            ],
            scrape_filter: ScrapeFilter {
                skip_classes: vec![
                    "litemodal-header".to_string(),
                    "p-dialog-header".to_string(),
                    "litemodal-buttons".to_string(),
                    "p-dialog-footer".to_string(),
                    "error-fixer-button".to_string(),
                ],
                skip_roles: vec!["button".to_string(), "link".to_string()],
                strip_labels: vec!["提示执行失败".to_string(), "查找问题".to_string()],
            },
        }
    }
}

/// Resolution of an error-dialog query: what to show and where "Fix" goes.
#[derive(Debug, Clone)]
pub struct FixAction {
    pub record: ErrorRecord,
    pub url: String,
}

/// The main entry point for execution-error triage.
pub struct Fixer {
    engine: Arc<dyn GraphEditorEngine>,
    correlator: ErrorCorrelator,
    launcher: FixPageLauncher,
    discovery: Box<dyn DialogDiscovery>,
    config: FixerConfig,
}

impl Fixer {
    pub fn new(engine: Arc<dyn GraphEditorEngine>, config: FixerConfig) -> Self {
        let launcher = FixPageLauncher::new(config.triage_base_url.clone());
        let discovery = AnchorButtonDiscovery::new(
            config.anchor_labels.clone(),
            config.dialog_classes.clone(),
        );
        Self {
            engine,
            correlator: ErrorCorrelator::new(),
            launcher,
            discovery: Box::new(discovery),
            config,
        }
    }

    /// Swap the dialog-discovery strategy.
    pub fn with_discovery(mut self, discovery: Box<dyn DialogDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.config.freshness_window_ms)
    }

    /// Capture a structured execution-error event pushed by the editor.
    ///
    /// Takes a best-effort workflow snapshot, stores the capture as the
    /// current error, and annotates the failing node when the event names one.
    #[instrument(skip(self, event))]
    pub async fn record_execution_error(&self, event: ExecutionErrorEvent) -> ErrorRecord {
        let workflow = match self.engine.serialize_workflow().await {
            Ok(json) => Some(json),
            Err(e) => {
                debug!(error = %e, "workflow snapshot unavailable");
                None
            }
        };
        let record = self.correlator.record(event, workflow);
        if let Some(node_id) = record.node_id.clone() {
            self.annotate(&node_id, &record).await;
        }
        record
    }

    async fn annotate(&self, node_id: &str, record: &ErrorRecord) {
        match self.engine.node(node_id).await {
            Ok(node) => {
                if annotate::annotate_node(&node, record) {
                    if let Err(e) = self.engine.request_redraw().await {
                        debug!(error = %e, "redraw request failed");
                    }
                }
            }
            Err(e) => warn!(node_id, error = %e, "failed to annotate node"),
        }
    }

    /// Best-known error description right now, using the configured freshness
    /// window.
    pub fn resolve_current_error(&self, raw_fallback: &str) -> ErrorRecord {
        self.correlator.resolve(raw_fallback, self.freshness_window())
    }

    /// Like [`Fixer::resolve_current_error`] with an explicit freshness window.
    pub fn resolve_with_window(&self, raw_fallback: &str, window: Duration) -> ErrorRecord {
        self.correlator.resolve(raw_fallback, window)
    }

    /// Resolve a fix action from pre-scraped dialog text.
    pub fn fix_action_from_text(&self, raw_text: &str) -> FixAction {
        let record = self.resolve_current_error(raw_text);
        let url = self.launcher.fix_url(&record);
        FixAction { record, url }
    }

    /// Resolve a fix action from a dialog snapshot.
    ///
    /// Discovery narrows the snapshot to the dialog carrying the anchor
    /// button; when no anchor is found the whole snapshot is scraped instead,
    /// since the frontend only sends snapshots for dialogs it already
    /// considers error dialogs.
    #[instrument(skip(self, snapshot))]
    pub fn handle_error_dialog(&self, snapshot: &UiNode) -> FixAction {
        let dialog = match self.discovery.find_dialog(snapshot) {
            Some(dialog) => dialog,
            None => {
                debug!("no dialog anchor found, scraping whole snapshot");
                snapshot
            }
        };
        let raw = sanitize::scrape_dialog_text(dialog, &self.config.scrape_filter);
        self.fix_action_from_text(&raw)
    }

    /// Open the fix page for `record` in a new browser context.
    #[instrument(skip(self, record))]
    pub async fn launch_fix_page(&self, record: &ErrorRecord) -> Result<(), FixerError> {
        self.launcher.launch(self.engine.as_ref(), record).await
    }

    /// The currently retained structured capture, if any.
    pub fn last_structured(&self) -> Option<ErrorRecord> {
        self.correlator.last_structured()
    }

    pub fn config(&self) -> &FixerConfig {
        &self.config
    }
}

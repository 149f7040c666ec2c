//! Outbound fix-page launch.

use tracing::{info, warn};

use crate::capture::ErrorRecord;
use crate::editor::GraphEditorEngine;
use crate::errors::FixerError;
use crate::sanitize::MAX_MESSAGE_LEN;

/// Default bug-triage endpoint.
pub const DEFAULT_TRIAGE_URL: &str = "https://bug.aix.ink";

/// Builds and opens bug-triage links for captured errors.
#[derive(Debug, Clone)]
pub struct FixPageLauncher {
    base_url: String,
}

impl FixPageLauncher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Triage URL for `record`. The message travels as a single `q` query
    /// parameter, URL-encoded and capped at [`MAX_MESSAGE_LEN`] characters.
    pub fn fix_url(&self, record: &ErrorRecord) -> String {
        let message: String = record.message.chars().take(MAX_MESSAGE_LEN).collect();
        let query = if message.is_empty() {
            "N/A"
        } else {
            message.as_str()
        };
        format!("{}?q={}", self.base_url, urlencoding::encode(query))
    }

    /// Open the fix page via the editor. Best effort: a downstream failure is
    /// logged and reported, never retried.
    pub async fn launch(
        &self,
        engine: &dyn GraphEditorEngine,
        record: &ErrorRecord,
    ) -> Result<(), FixerError> {
        let url = self.fix_url(record);
        info!(id = %record.id, url_len = url.len(), "opening fix page");
        engine.open_url(&url).await.map_err(|e| {
            warn!(error = %e, "fix page launch failed");
            FixerError::LaunchFailed(e.to_string())
        })
    }
}

impl Default for FixPageLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_TRIAGE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ErrorCorrelator, ExecutionErrorEvent};

    fn record(message: &str) -> ErrorRecord {
        let correlator = ErrorCorrelator::new();
        correlator.record(
            ExecutionErrorEvent {
                exception_message: Some(message.to_string()),
                ..Default::default()
            },
            None,
        )
    }

    #[test]
    fn test_fix_url_encodes_message() {
        let launcher = FixPageLauncher::default();
        let url = launcher.fix_url(&record("Tensor size mismatch"));
        assert_eq!(url, "https://bug.aix.ink?q=Tensor%20size%20mismatch");
    }

    #[test]
    fn test_fix_url_encodes_reserved_and_non_ascii() {
        let launcher = FixPageLauncher::new("http://triage.local");
        let url = launcher.fix_url(&record("a&b=c 错误"));
        assert_eq!(
            url,
            "http://triage.local?q=a%26b%3Dc%20%E9%94%99%E8%AF%AF"
        );
    }

    #[test]
    fn test_fix_url_falls_back_for_empty_message() {
        let launcher = FixPageLauncher::default();
        let url = launcher.fix_url(&record(""));
        assert_eq!(url, "https://bug.aix.ink?q=N%2FA");
    }

    #[test]
    fn test_fix_url_caps_oversized_message() {
        let launcher = FixPageLauncher::default();
        // A record built outside the sanitize path could exceed the cap; the
        // launcher re-applies it before encoding.
        let url = launcher.fix_url(&record(&"x".repeat(3000)));
        let query = url.split("?q=").nth(1).unwrap();
        assert_eq!(query.len(), 2000);
    }
}

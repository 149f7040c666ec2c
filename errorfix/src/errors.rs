use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixerError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Editor unavailable: {0}")]
    EditorUnavailable(String),

    #[error("Bridge unavailable: {0}")]
    BridgeUnavailable(String),

    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),

    #[error("Failed to launch fix page: {0}")]
    LaunchFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

use thiserror::Error;

/// Main error type for agentmap
#[derive(Error, Debug)]
pub enum AgentMapError {
    /// A node id that is not part of the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Snapshot could not be thawed (bad version, malformed content)
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Snapshot wire encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the display collaborator. Never surfaced by knowledge operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The display was already torn down, or its runtime dropped the handle
    #[error("display already closed")]
    Closed,

    /// The display runtime could not be reached
    #[error("display unavailable: {0}")]
    Unavailable(String),
}

/// Convenient Result type using AgentMapError
pub type Result<T> = std::result::Result<T, AgentMapError>;

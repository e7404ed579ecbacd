//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The underlying engine environment could not be created. Surfaced once
    /// to whoever opened the tab; never retried automatically.
    #[error("engine initialization failed: {0}")]
    Init(String),

    /// A best-effort process-id query failed. Callers absorb this and fall
    /// back to an empty set.
    #[error("process id query failed: {0}")]
    ProcessQuery(String),
}

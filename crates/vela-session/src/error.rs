//! Session error types

use thiserror::Error;
use uuid::Uuid;

use vela_engine::EngineError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// An engine view could not be created for a new tab. Surfaced once to
    /// the caller of `add_tab`; never retried automatically.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("tab not found: {0}")]
    TabNotFound(Uuid),
}

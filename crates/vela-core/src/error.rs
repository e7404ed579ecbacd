//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("engine error: {0}")]
    Engine(#[from] vela_engine::EngineError),

    #[error("session error: {0}")]
    Session(#[from] vela_session::SessionError),
}

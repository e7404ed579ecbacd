//! VELA Engine Contract
//!
//! The capability boundary between the session core and whatever concrete
//! rendering engine is plugged in. The core never links an engine directly;
//! it only ever sees these traits and events.

mod error;
mod event;
mod view;

pub use error::EngineError;
pub use event::EngineEvent;
pub use view::{EngineView, EngineViewFactory};

pub type Result<T> = std::result::Result<T, EngineError>;

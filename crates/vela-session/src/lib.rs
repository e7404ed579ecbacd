//! VELA Session Management
//!
//! Owns the ordered collection of tab sessions and the periodic resource
//! polling loop. The manager never touches a concrete rendering engine:
//! tabs are created through an injected [`vela_engine::EngineViewFactory`],
//! and aggregated metrics are published to whoever subscribes.

mod error;
mod event;
mod manager;
mod poller;

pub use error::SessionError;
pub use event::SessionEvent;
pub use manager::SessionManager;
pub use poller::PollerConfig;

pub type Result<T> = std::result::Result<T, SessionError>;

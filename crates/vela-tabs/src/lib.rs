//! VELA Tab Sessions
//!
//! One `TabSession` per browsing context: it owns exactly one engine view,
//! normalizes navigation input, forwards commands, and mirrors the engine's
//! url/title/loading events into observable page state.

mod input;
mod session;

pub use input::normalize;
pub use session::TabSession;

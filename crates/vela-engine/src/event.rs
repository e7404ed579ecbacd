//! Engine event stream

/// State change reported by a rendering engine.
///
/// Events travel through a broadcast channel rather than direct callbacks,
/// so an engine firing an event can never re-enter a navigation command on
/// the same call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The displayed document's URL changed.
    UrlChanged(String),
    /// The document title changed.
    TitleChanged(String),
    /// The engine started (`true`) or finished (`false`) loading.
    LoadingChanged(bool),
}

//! Manager-level events for the presentation layer

use uuid::Uuid;

/// Tab-collection change, published on the manager's broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    TabOpened(Uuid),
    TabClosed(Uuid),
    /// Selection moved. Pure state change; no engine side effect.
    TabSelected(Uuid),
}

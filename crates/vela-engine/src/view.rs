//! The navigable rendering-surface contract

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{EngineEvent, Result};

/// A navigable web-rendering surface.
///
/// Exactly one tab session owns one view for the view's entire lifetime.
/// Command methods are fire-and-forget: the engine applies them on whatever
/// execution context the host UI framework demands, and reports resulting
/// state changes through the event stream.
#[async_trait]
pub trait EngineView: Send + Sync {
    /// Stand up the underlying engine environment rooted at `profile_dir`.
    async fn initialize(&self, profile_dir: &str) -> Result<()>;

    /// Load `url`. The caller is responsible for normalization; the URL is
    /// passed to the engine verbatim.
    fn navigate(&self, url: &str);

    fn go_back(&self);
    fn go_forward(&self);
    fn reload(&self);
    fn stop(&self);
    fn open_dev_tools(&self);

    /// OS process ids currently backing this surface. Best-effort: may be
    /// empty, must not block indefinitely.
    async fn process_ids(&self) -> Result<HashSet<u32>>;

    /// Register an observer for url/title/loading changes.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Produces ready-to-use engine views, one per tab.
///
/// Engine selection and profile-directory wiring are the implementor's
/// concern; a view returned from `create_view` is already initialized.
#[async_trait]
pub trait EngineViewFactory: Send + Sync {
    async fn create_view(&self) -> Result<Arc<dyn EngineView>>;
}

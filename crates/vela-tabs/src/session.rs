//! Tab session

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use vela_engine::{EngineEvent, EngineView};

use crate::input;

/// Capacity of the re-broadcast channel; sized for bursty load events from
/// a single page.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Observable page state, updated only by the engine's own events.
#[derive(Debug, Clone)]
struct PageState {
    address: String,
    title: String,
    loading: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            address: String::new(),
            title: "New Tab".to_string(),
            loading: false,
        }
    }
}

/// One browsing context bound to exactly one engine view.
///
/// The view is never shared with another session. Commands forward to the
/// engine; state flows back exclusively through the engine's event stream,
/// which a background task mirrors into [`PageState`] and re-broadcasts to
/// this session's own subscribers.
pub struct TabSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    engine: Arc<dyn EngineView>,
    page: Arc<RwLock<PageState>>,
    events: broadcast::Sender<EngineEvent>,
    forwarder: JoinHandle<()>,
}

impl TabSession {
    /// Wrap an initialized engine view. Must run inside a tokio runtime:
    /// the event-forwarding task is spawned here.
    pub fn new(engine: Arc<dyn EngineView>) -> Self {
        let id = Uuid::new_v4();
        let page = Arc::new(RwLock::new(PageState::default()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let forwarder = Self::spawn_forwarder(
            id,
            engine.subscribe(),
            Arc::clone(&page),
            events.clone(),
        );

        Self {
            id,
            created_at: Utc::now(),
            engine,
            page,
            events,
            forwarder,
        }
    }

    fn spawn_forwarder(
        id: Uuid,
        mut rx: broadcast::Receiver<EngineEvent>,
        page: Arc<RwLock<PageState>>,
        tx: broadcast::Sender<EngineEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        {
                            let mut page = page.write();
                            match &event {
                                EngineEvent::UrlChanged(url) => page.address = url.clone(),
                                EngineEvent::TitleChanged(title) => page.title = title.clone(),
                                EngineEvent::LoadingChanged(loading) => page.loading = *loading,
                            }
                        }
                        // No subscribers is fine; state was still updated.
                        let _ = tx.send(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(tab_id = %id, skipped, "engine event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current address as last reported by the engine.
    pub fn address(&self) -> String {
        self.page.read().address.clone()
    }

    /// Current page title.
    pub fn title(&self) -> String {
        self.page.read().title.clone()
    }

    /// Title with fallback to the address for untitled pages.
    pub fn display_title(&self) -> String {
        let page = self.page.read();
        if page.title.is_empty() {
            page.address.clone()
        } else {
            page.title.clone()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.page.read().loading
    }

    /// Register an observer for this tab's url/title/loading changes.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Normalize `input` and navigate the engine to it. Blank input issues
    /// no navigation at all.
    pub fn navigate(&self, input: &str) {
        if let Some(url) = input::normalize(input) {
            tracing::debug!(tab_id = %self.id, url = %url, "navigating");
            self.engine.navigate(&url);
        }
    }

    pub fn back(&self) {
        self.engine.go_back();
    }

    pub fn forward(&self) {
        self.engine.go_forward();
    }

    pub fn reload(&self) {
        self.engine.reload();
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn open_dev_tools(&self) {
        self.engine.open_dev_tools();
    }

    /// OS processes backing this tab. Discovery is best-effort: any engine
    /// failure degrades to an empty set.
    pub async fn process_ids(&self) -> HashSet<u32> {
        match self.engine.process_ids().await {
            Ok(pids) => pids,
            Err(error) => {
                tracing::debug!(tab_id = %self.id, %error, "process id query failed");
                HashSet::new()
            }
        }
    }

    /// Stop the engine and the event forwarder. The owner discards the
    /// session afterwards; no further teardown is required.
    pub fn close(&self) {
        self.engine.stop();
        self.forwarder.abort();
        tracing::info!(tab_id = %self.id, "closed tab session");
    }
}

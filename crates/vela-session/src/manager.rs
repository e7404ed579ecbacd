//! Session Manager
//!
//! Owns the ordered tab collection and the metrics polling loop. Closing
//! the last tab immediately opens a fresh blank one: the collection is
//! never empty while the manager is running.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use vela_engine::EngineViewFactory;
use vela_metrics::{AggregatedMetrics, Sampler, SystemSampler};
use vela_tabs::TabSession;

use crate::event::SessionEvent;
use crate::poller::{self, PollerConfig, Tick};
use crate::{Result, SessionError};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct SessionManager {
    /// Ordered tab collection; add/close may race a tick's snapshot phase,
    /// which is why ticks clone the Vec before iterating.
    tabs: Arc<RwLock<Vec<Arc<TabSession>>>>,
    /// Currently selected tab id
    selected: Arc<RwLock<Option<Uuid>>>,
    /// Produces one initialized engine view per tab
    factory: Arc<dyn EngineViewFactory>,
    /// Tab-collection change notifications
    events: broadcast::Sender<SessionEvent>,
    /// Latest aggregated metrics for the presentation layer
    metrics_tx: Arc<watch::Sender<AggregatedMetrics>>,
    /// Taken by the polling loop on `start`; `None` once running
    sampler: Arc<Mutex<Option<Box<dyn Sampler>>>>,
    shutdown: broadcast::Sender<()>,
    config: PollerConfig,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn EngineViewFactory>, config: PollerConfig) -> Self {
        Self::with_sampler(factory, config, Box::new(SystemSampler::system()))
    }

    /// Build a manager around an explicit sampler. Tests use this to feed
    /// the loop scripted readings.
    pub fn with_sampler(
        factory: Arc<dyn EngineViewFactory>,
        config: PollerConfig,
        sampler: Box<dyn Sampler>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (metrics_tx, _) = watch::channel(AggregatedMetrics::default());
        let (shutdown, _) = broadcast::channel(1);

        Self {
            tabs: Arc::new(RwLock::new(Vec::new())),
            selected: Arc::new(RwLock::new(None)),
            factory,
            events,
            metrics_tx: Arc::new(metrics_tx),
            sampler: Arc::new(Mutex::new(Some(sampler))),
            shutdown,
            config,
        }
    }

    /// Open a new tab: create an engine view through the factory, wrap it,
    /// append it to the collection and select it. Engine-init failure is
    /// returned to the caller once; it is not retried here.
    pub async fn add_tab(&self, url: Option<&str>) -> Result<Arc<TabSession>> {
        let view = self.factory.create_view().await?;
        let tab = Arc::new(TabSession::new(view));

        self.tabs.write().push(Arc::clone(&tab));
        *self.selected.write() = Some(tab.id());
        let _ = self.events.send(SessionEvent::TabOpened(tab.id()));
        let _ = self.events.send(SessionEvent::TabSelected(tab.id()));

        if let Some(url) = url {
            tab.navigate(url);
        }

        tracing::info!(tab_id = %tab.id(), "opened tab");

        Ok(tab)
    }

    /// Close a tab and discard its session. Closing the last tab opens a
    /// fresh blank one; closing the selected tab moves selection to the
    /// last tab in order.
    pub async fn close_tab(&self, tab_id: Uuid) -> Result<()> {
        let closed = {
            let mut tabs = self.tabs.write();
            let index = tabs
                .iter()
                .position(|tab| tab.id() == tab_id)
                .ok_or(SessionError::TabNotFound(tab_id))?;
            tabs.remove(index)
        };

        closed.close();
        let _ = self.events.send(SessionEvent::TabClosed(tab_id));
        tracing::info!(tab_id = %tab_id, "closed tab");

        let last_remaining = self.tabs.read().last().cloned();
        match last_remaining {
            None => {
                // Never zero tabs while running.
                self.add_tab(None).await?;
            }
            Some(last) => {
                let selected = *self.selected.read();
                if selected == Some(tab_id) || selected.is_none() {
                    *self.selected.write() = Some(last.id());
                    let _ = self.events.send(SessionEvent::TabSelected(last.id()));
                }
            }
        }

        Ok(())
    }

    /// Mark a tab as selected. Pure state change; the engine view is not
    /// touched.
    pub fn select_tab(&self, tab_id: Uuid) -> Result<()> {
        if !self.tabs.read().iter().any(|tab| tab.id() == tab_id) {
            return Err(SessionError::TabNotFound(tab_id));
        }

        *self.selected.write() = Some(tab_id);
        let _ = self.events.send(SessionEvent::TabSelected(tab_id));
        Ok(())
    }

    /// Snapshot of the ordered tab collection.
    pub fn tabs(&self) -> Vec<Arc<TabSession>> {
        self.tabs.read().clone()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.read().len()
    }

    pub fn selected_id(&self) -> Option<Uuid> {
        *self.selected.read()
    }

    pub fn selected_tab(&self) -> Option<Arc<TabSession>> {
        let selected = *self.selected.read();
        selected.and_then(|id| self.tabs.read().iter().find(|tab| tab.id() == id).cloned())
    }

    /// Latest aggregated metrics; updated once per polling tick.
    pub fn metrics(&self) -> watch::Receiver<AggregatedMetrics> {
        self.metrics_tx.subscribe()
    }

    /// Register an observer for tab-collection changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Spawn the metrics polling loop. Returns `None` if it is already
    /// running; the loop stops only via [`SessionManager::shutdown`].
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let tick = self.build_tick()?;
        tracing::info!(interval = ?self.config.poll_interval, "starting metrics polling loop");
        Some(tokio::spawn(poller::run(
            tick,
            self.config.clone(),
            self.shutdown.subscribe(),
        )))
    }

    /// Signal the polling loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    fn build_tick(&self) -> Option<MetricsTick> {
        let sampler = self.sampler.lock().take()?;
        Some(MetricsTick {
            tabs: Arc::clone(&self.tabs),
            sampler,
            metrics_tx: Arc::clone(&self.metrics_tx),
            query_timeout: self.config.pid_query_timeout,
        })
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            tabs: Arc::clone(&self.tabs),
            selected: Arc::clone(&self.selected),
            factory: Arc::clone(&self.factory),
            events: self.events.clone(),
            metrics_tx: Arc::clone(&self.metrics_tx),
            sampler: Arc::clone(&self.sampler),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
        }
    }
}

/// One polling tick: snapshot the tab list, query every tab's process ids
/// concurrently (each bounded by the query timeout), union the results and
/// feed them to the sampler.
struct MetricsTick {
    tabs: Arc<RwLock<Vec<Arc<TabSession>>>>,
    sampler: Box<dyn Sampler>,
    metrics_tx: Arc<watch::Sender<AggregatedMetrics>>,
    query_timeout: std::time::Duration,
}

#[async_trait]
impl Tick for MetricsTick {
    async fn run(&mut self) -> anyhow::Result<()> {
        // Snapshot before iterating; add/close may mutate the collection
        // while the queries are in flight.
        let snapshot = self.tabs.read().clone();

        let timeout = self.query_timeout;
        let queries = snapshot.iter().map(|tab| {
            let tab = Arc::clone(tab);
            async move {
                match tokio::time::timeout(timeout, tab.process_ids()).await {
                    Ok(pids) => pids,
                    Err(_) => {
                        tracing::debug!(tab_id = %tab.id(), "process id query timed out");
                        HashSet::new()
                    }
                }
            }
        });

        let pids: HashSet<u32> = future::join_all(queries).await.into_iter().flatten().collect();
        let metrics = self.sampler.sample(&pids);
        self.metrics_tx.send_replace(metrics);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use vela_engine::{EngineError, EngineEvent, EngineView};

    use super::*;

    #[derive(Default)]
    struct MockEngine {
        pids: HashSet<u32>,
        navigations: Mutex<Vec<String>>,
        hang_pid_query: bool,
    }

    impl MockEngine {
        fn with_pids(pids: &[u32]) -> Self {
            Self {
                pids: pids.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl EngineView for MockEngine {
        async fn initialize(&self, _profile_dir: &str) -> vela_engine::Result<()> {
            Ok(())
        }

        fn navigate(&self, url: &str) {
            self.navigations.lock().push(url.to_string());
        }

        fn go_back(&self) {}
        fn go_forward(&self) {}
        fn reload(&self) {}
        fn stop(&self) {}
        fn open_dev_tools(&self) {}

        async fn process_ids(&self) -> vela_engine::Result<HashSet<u32>> {
            if self.hang_pid_query {
                // Longer than any test's query timeout.
                sleep(Duration::from_secs(3600)).await;
            }
            Ok(self.pids.clone())
        }

        fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
            broadcast::channel(1).1
        }
    }

    /// Factory handing out a prepared queue of engines, then blank ones.
    #[derive(Default)]
    struct MockFactory {
        queue: Mutex<Vec<Arc<MockEngine>>>,
        fail: bool,
    }

    impl MockFactory {
        fn queued(engines: Vec<Arc<MockEngine>>) -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(engines),
                fail: false,
            })
        }
    }

    #[async_trait]
    impl EngineViewFactory for MockFactory {
        async fn create_view(&self) -> vela_engine::Result<Arc<dyn EngineView>> {
            if self.fail {
                return Err(EngineError::Init("no engine available".to_string()));
            }
            let engine = {
                let mut queue = self.queue.lock();
                if queue.is_empty() {
                    Arc::new(MockEngine::default())
                } else {
                    queue.remove(0)
                }
            };
            Ok(engine)
        }
    }

    /// Sampler double recording each pid set it is fed.
    struct RecordingSampler {
        seen: Arc<Mutex<Vec<HashSet<u32>>>>,
        result: AggregatedMetrics,
    }

    impl Sampler for RecordingSampler {
        fn sample(&mut self, pids: &HashSet<u32>) -> AggregatedMetrics {
            self.seen.lock().push(pids.clone());
            self.result
        }
    }

    fn manager_with_recording_sampler(
        factory: Arc<MockFactory>,
        result: AggregatedMetrics,
    ) -> (SessionManager, Arc<Mutex<Vec<HashSet<u32>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sampler = RecordingSampler {
            seen: Arc::clone(&seen),
            result,
        };
        let manager = SessionManager::with_sampler(
            factory,
            PollerConfig::default(),
            Box::new(sampler),
        );
        (manager, seen)
    }

    #[tokio::test]
    async fn test_first_tab_is_selected() {
        let manager = SessionManager::new(Arc::new(MockFactory::default()), PollerConfig::default());

        assert_eq!(manager.tab_count(), 0);
        let tab = manager.add_tab(None).await.unwrap();

        assert_eq!(manager.tab_count(), 1);
        assert_eq!(manager.selected_id(), Some(tab.id()));
    }

    #[tokio::test]
    async fn test_add_tab_with_url_navigates() {
        let engine = Arc::new(MockEngine::default());
        let factory = MockFactory::queued(vec![Arc::clone(&engine)]);
        let manager = SessionManager::new(factory, PollerConfig::default());

        manager.add_tab(Some("example.com")).await.unwrap();

        assert_eq!(engine.navigations.lock().clone(), vec!["https://example.com"]);
    }

    #[tokio::test]
    async fn test_closing_last_tab_opens_a_fresh_one() {
        let manager = SessionManager::new(Arc::new(MockFactory::default()), PollerConfig::default());

        let tab = manager.add_tab(None).await.unwrap();
        manager.close_tab(tab.id()).await.unwrap();

        // Still exactly one tab, but a new blank one, and it is selected.
        assert_eq!(manager.tab_count(), 1);
        let replacement = manager.tabs()[0].id();
        assert_ne!(replacement, tab.id());
        assert_eq!(manager.selected_id(), Some(replacement));
    }

    #[tokio::test]
    async fn test_closing_selected_tab_selects_last_in_order() {
        let manager = SessionManager::new(Arc::new(MockFactory::default()), PollerConfig::default());

        let first = manager.add_tab(None).await.unwrap();
        let second = manager.add_tab(None).await.unwrap();
        let third = manager.add_tab(None).await.unwrap();

        manager.select_tab(second.id()).unwrap();
        manager.close_tab(second.id()).await.unwrap();

        assert_eq!(manager.tab_count(), 2);
        assert_eq!(manager.selected_id(), Some(third.id()));

        // Closing an unselected tab leaves selection alone.
        manager.close_tab(first.id()).await.unwrap();
        assert_eq!(manager.selected_id(), Some(third.id()));
    }

    #[tokio::test]
    async fn test_close_unknown_tab_is_an_error() {
        let manager = SessionManager::new(Arc::new(MockFactory::default()), PollerConfig::default());
        manager.add_tab(None).await.unwrap();

        let result = manager.close_tab(Uuid::new_v4()).await;
        assert!(matches!(result, Err(SessionError::TabNotFound(_))));
        assert_eq!(manager.tab_count(), 1);
    }

    #[tokio::test]
    async fn test_engine_init_failure_is_surfaced_once() {
        let factory = Arc::new(MockFactory {
            queue: Mutex::new(Vec::new()),
            fail: true,
        });
        let manager = SessionManager::new(factory, PollerConfig::default());

        let result = manager.add_tab(None).await;
        assert!(matches!(
            result,
            Err(SessionError::Engine(EngineError::Init(_)))
        ));
        assert_eq!(manager.tab_count(), 0);
    }

    #[tokio::test]
    async fn test_tick_unions_pid_sets_across_tabs() {
        // One tab reports {200, 201}, another {201} (shared helper
        // process); the sampler must see each pid once.
        let factory = MockFactory::queued(vec![
            Arc::new(MockEngine::with_pids(&[200, 201])),
            Arc::new(MockEngine::with_pids(&[201])),
        ]);
        let (manager, seen) =
            manager_with_recording_sampler(factory, AggregatedMetrics::default());

        manager.add_tab(None).await.unwrap();
        manager.add_tab(None).await.unwrap();

        let mut tick = manager.build_tick().unwrap();
        tick.run().await.unwrap();

        assert_eq!(seen.lock().as_slice(), &[HashSet::from([200, 201])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_pid_query_does_not_stall_the_tick() {
        let hung = Arc::new(MockEngine {
            pids: HashSet::from([300]),
            hang_pid_query: true,
            ..Default::default()
        });
        let factory = MockFactory::queued(vec![
            Arc::new(MockEngine::with_pids(&[200])),
            hung,
        ]);
        let (manager, seen) =
            manager_with_recording_sampler(factory, AggregatedMetrics::default());

        manager.add_tab(None).await.unwrap();
        manager.add_tab(None).await.unwrap();

        let mut tick = manager.build_tick().unwrap();
        tick.run().await.unwrap();

        // The hung tab contributes nothing; the healthy one still counts.
        assert_eq!(seen.lock().as_slice(), &[HashSet::from([200])]);
    }

    #[tokio::test]
    async fn test_tick_publishes_metrics() {
        let result = AggregatedMetrics {
            memory_mb: 128.3,
            cpu_percent: 12.4,
        };
        let (manager, _) =
            manager_with_recording_sampler(Arc::new(MockFactory::default()), result);
        manager.add_tab(None).await.unwrap();

        let rx = manager.metrics();
        let mut tick = manager.build_tick().unwrap();
        tick.run().await.unwrap();

        let published = *rx.borrow();
        assert_eq!(published, result);
        assert_eq!(published.memory_label(), "128.3 MB");
        assert_eq!(published.cpu_label(), "12.4%");
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_once_and_shutdown() {
        let (manager, seen) = manager_with_recording_sampler(
            Arc::new(MockFactory::default()),
            AggregatedMetrics::default(),
        );

        let handle = manager.start().expect("first start runs the loop");
        assert!(manager.start().is_none(), "loop must not run twice");

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        manager.shutdown();
        handle.await.unwrap();

        // Ticks at 0s, 1s and 2s before the shutdown landed.
        assert_eq!(seen.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_events_follow_tab_lifecycle() {
        let manager = SessionManager::new(Arc::new(MockFactory::default()), PollerConfig::default());
        let mut rx = manager.subscribe();

        let tab = manager.add_tab(None).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabOpened(tab.id()));
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabSelected(tab.id()));

        manager.close_tab(tab.id()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::TabClosed(tab.id()));
    }
}

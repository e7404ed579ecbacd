//! Browser facade
//!
//! Ties the pieces together for a host application: one session manager,
//! one running metrics loop, one initial tab at the configured homepage.

use std::sync::Arc;

use tokio::task::JoinHandle;

use vela_engine::EngineViewFactory;
use vela_session::SessionManager;

use crate::{Config, Result};

pub struct Browser {
    manager: SessionManager,
    poller: Option<JoinHandle<()>>,
    config: Config,
}

impl Browser {
    /// Stand up a browser core: start the metrics polling loop and open
    /// the initial tab. An engine-init failure surfaces here exactly once.
    ///
    /// The factory is expected to have `config.profile_dir` (and any
    /// `config.user_agent` override) wired in by the host: engine views it
    /// hands out are already initialized against that profile.
    pub async fn launch(factory: Arc<dyn EngineViewFactory>, config: Config) -> Result<Self> {
        let manager = SessionManager::new(factory, config.poller.clone());
        let poller = manager.start();

        manager.add_tab(Some(&config.homepage)).await?;

        tracing::info!(homepage = %config.homepage, "browser core launched");

        Ok(Self {
            manager,
            poller,
            config,
        })
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop the polling loop and wait for it to wind down. Tab sessions
    /// are dropped with the manager.
    pub async fn shutdown(mut self) {
        self.manager.shutdown();
        if let Some(poller) = self.poller.take() {
            let _ = poller.await;
        }
        tracing::info!("browser core shut down");
    }
}

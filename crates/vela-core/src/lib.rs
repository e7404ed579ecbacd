//! VELA Core
//!
//! Central coordination layer for the VELA browser shell. Wires an
//! engine-view factory and a configuration into a running session manager;
//! everything engine-specific stays behind the `vela-engine` contract.

mod browser;
mod config;
mod error;

pub use browser::Browser;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use vela_engine::{EngineError, EngineEvent, EngineView, EngineViewFactory};
pub use vela_metrics::{AggregatedMetrics, MetricsSampler, ProcessProbe, ProcessStats, Sampler};
pub use vela_session::{PollerConfig, SessionError, SessionEvent, SessionManager};
pub use vela_tabs::TabSession;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}

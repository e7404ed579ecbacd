//! Browser configuration
//!
//! A plain value type: reading and writing it to disk is the startup
//! layer's job, not this crate's.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use vela_session::PollerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL the initial tab opens at
    pub homepage: String,
    /// Override for the engine's user-agent string
    pub user_agent: Option<String>,
    /// Profile directory handed through to the engine factory, opaque to
    /// the core
    pub profile_dir: PathBuf,
    /// Metrics polling cadence
    #[serde(default)]
    pub poller: PollerConfig,
}

impl Config {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            homepage: "https://www.google.com".to_string(),
            user_agent: None,
            profile_dir,
            poller: PollerConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from(".vela"))
    }
}

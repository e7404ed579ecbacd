//! VELA Metrics
//!
//! Aggregated CPU/memory figures for the (possibly many) OS processes
//! backing the open tabs. CPU usage is computed from deltas of cumulative
//! processor time across successive samples; per-process history is kept
//! only for pids present in the most recent sampling set.
//!
//! Nothing in this crate ever returns an error: every per-process failure
//! degrades to "contribute nothing this tick".

mod metrics;
mod probe;
mod sampler;

pub use metrics::AggregatedMetrics;
pub use probe::{ProcessProbe, ProcessStats, SysinfoProbe};
pub use sampler::{MetricsSampler, Sampler, SystemSampler};

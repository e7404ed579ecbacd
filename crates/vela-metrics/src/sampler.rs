//! Delta-based CPU/memory aggregation
//!
//! Per-pid history lives in an arena owned exclusively by the sampler.
//! Entries are created on first observation, replaced on every subsequent
//! one, and evicted the moment a pid leaves the sampling set or becomes
//! unreadable, so the map never outgrows the set of live tab processes.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::metrics::AggregatedMetrics;
use crate::probe::{ProcessProbe, SysinfoProbe};

/// Object-safe sampling surface, so consumers can hold a trait object and
/// tests can substitute a recorder.
pub trait Sampler: Send {
    fn sample(&mut self, pids: &HashSet<u32>) -> AggregatedMetrics;
}

/// History for one tracked pid.
struct PidState {
    last_sample: Instant,
    last_cpu_ms: u64,
}

/// Converts a set of process ids into one `(memory_mb, cpu_percent)` pair,
/// maintaining cross-call history for the CPU deltas.
pub struct MetricsSampler<P: ProcessProbe> {
    probe: P,
    states: HashMap<u32, PidState>,
}

/// The production sampler, reading live stats through `sysinfo`.
pub type SystemSampler = MetricsSampler<SysinfoProbe>;

impl SystemSampler {
    pub fn system() -> Self {
        Self::new(SysinfoProbe::new())
    }
}

impl<P: ProcessProbe> MetricsSampler<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            states: HashMap::new(),
        }
    }

    /// Take one sample at the current instant.
    pub fn sample(&mut self, pids: &HashSet<u32>) -> AggregatedMetrics {
        self.sample_at(Instant::now(), pids)
    }

    /// Take one sample at an explicit instant. The host process's own pid
    /// is always included, whether or not the caller passed it.
    pub fn sample_at(&mut self, now: Instant, pids: &HashSet<u32>) -> AggregatedMetrics {
        let mut current = pids.clone();
        current.insert(self.probe.host_pid());

        // Pids gone from the sampling set take their history with them.
        self.states.retain(|pid, _| current.contains(pid));

        let readings = self.probe.collect(&current);

        let mut total_resident_bytes: u64 = 0;
        let mut cpu_core_percent_sum = 0.0_f64;

        for &pid in &current {
            let Some(stats) = readings.get(&pid) else {
                // Exited or access denied; forget it entirely.
                if self.states.remove(&pid).is_some() {
                    tracing::trace!(pid, "evicted unreadable process");
                }
                continue;
            };

            if let Some(prev) = self.states.get(&pid) {
                let cpu_delta_ms = stats.cpu_time_ms.saturating_sub(prev.last_cpu_ms) as f64;
                let wall_delta_ms = now.duration_since(prev.last_sample).as_secs_f64() * 1000.0;

                if wall_delta_ms > 0.0 {
                    cpu_core_percent_sum += (cpu_delta_ms / wall_delta_ms) * 100.0;
                }
            }
            // First observation contributes 0: a fresh process's usage is
            // unknown until a second sample establishes a delta.

            self.states.insert(
                pid,
                PidState {
                    last_sample: now,
                    last_cpu_ms: stats.cpu_time_ms,
                },
            );

            total_resident_bytes += stats.resident_bytes;
        }

        AggregatedMetrics::from_totals(
            total_resident_bytes,
            cpu_core_percent_sum,
            self.probe.cpu_count(),
        )
    }
}

impl<P: ProcessProbe + 'static> Sampler for MetricsSampler<P> {
    fn sample(&mut self, pids: &HashSet<u32>) -> AggregatedMetrics {
        MetricsSampler::sample(self, pids)
    }
}

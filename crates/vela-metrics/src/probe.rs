//! Live process stat reads
//!
//! The sampler talks to the OS through `ProcessProbe` so its delta
//! arithmetic can be tested against scripted readings. The production
//! probe wraps `sysinfo` and refreshes only the pids it is asked about.

use std::collections::{HashMap, HashSet};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// One process's live readings at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStats {
    /// Resident (working set) memory in bytes.
    pub resident_bytes: u64,
    /// Cumulative CPU time consumed since process start, in milliseconds.
    pub cpu_time_ms: u64,
}

/// Source of per-process readings.
///
/// `collect` returns an entry for every pid it could read; a pid missing
/// from the result has exited or denied access, and the caller treats it
/// accordingly.
pub trait ProcessProbe: Send {
    /// The host process's own pid (self-monitoring).
    fn host_pid(&self) -> u32;

    /// Number of logical processors, used to normalize CPU percentages.
    fn cpu_count(&self) -> usize;

    fn collect(&mut self, pids: &HashSet<u32>) -> HashMap<u32, ProcessStats>;
}

/// `sysinfo`-backed probe.
pub struct SysinfoProbe {
    system: System,
    host_pid: u32,
    cpu_count: usize,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();
        let cpu_count = system.cpus().len();

        Self {
            system,
            host_pid: std::process::id(),
            cpu_count,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn host_pid(&self) -> u32 {
        self.host_pid
    }

    fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    fn collect(&mut self, pids: &HashSet<u32>) -> HashMap<u32, ProcessStats> {
        let wanted: Vec<Pid> = pids.iter().map(|&pid| Pid::from_u32(pid)).collect();

        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&wanted),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        pids.iter()
            .filter_map(|&pid| {
                self.system.process(Pid::from_u32(pid)).map(|process| {
                    (
                        pid,
                        ProcessStats {
                            resident_bytes: process.memory(),
                            cpu_time_ms: process.accumulated_cpu_time(),
                        },
                    )
                })
            })
            .collect()
    }
}

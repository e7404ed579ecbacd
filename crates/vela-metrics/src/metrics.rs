//! Aggregated metric values

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// One tick's worth of aggregated resource figures. Produced fresh every
/// sample; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Sum of resident memory across all sampled processes, in megabytes.
    pub memory_mb: f64,
    /// Share of total machine capacity, 0-100. The per-process core
    /// percentages are summed and divided by the logical processor count,
    /// so a single saturated core on a 4-core machine reads as 25.
    pub cpu_percent: f64,
}

impl AggregatedMetrics {
    pub(crate) fn from_totals(resident_bytes: u64, cpu_core_percent_sum: f64, cpu_count: usize) -> Self {
        Self {
            memory_mb: resident_bytes as f64 / BYTES_PER_MB,
            cpu_percent: cpu_core_percent_sum / cpu_count.max(1) as f64,
        }
    }

    /// Display string for the status bar, e.g. `"128.3 MB"`.
    pub fn memory_label(&self) -> String {
        format!("{:.1} MB", self.memory_mb)
    }

    /// Display string for the status bar, e.g. `"12.4%"`.
    pub fn cpu_label(&self) -> String {
        format!("{:.1}%", self.cpu_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_keep_one_decimal() {
        let metrics = AggregatedMetrics {
            memory_mb: 128.337,
            cpu_percent: 12.449,
        };
        assert_eq!(metrics.memory_label(), "128.3 MB");
        assert_eq!(metrics.cpu_label(), "12.4%");
    }

    #[test]
    fn test_memory_is_exact_byte_sum() {
        // 3 MB plus one byte, no intermediate rounding
        let metrics = AggregatedMetrics::from_totals(3 * 1_048_576 + 1, 0.0, 4);
        assert_eq!(metrics.memory_mb, (3.0 * 1_048_576.0 + 1.0) / 1_048_576.0);
    }

    #[test]
    fn test_zero_cores_does_not_divide_by_zero() {
        let metrics = AggregatedMetrics::from_totals(0, 50.0, 0);
        assert_eq!(metrics.cpu_percent, 50.0);
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dispatch metrics.
//!
//! [`DispatchMetrics`] records how much work a [`RunPlan`](crate::RunPlan)
//! carried and how long each unit took to execute.

use std::time::Duration;
use tile_planner::Backend;

/// Timing of one work unit (one task range).
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnitMetrics {
    /// Index of the unit within the plan.
    pub unit: usize,
    /// Tiles the unit processed.
    pub tiles: usize,
    /// Wall-clock time spent in kernels.
    pub duration: Duration,
}

/// Aggregate metrics for one dispatch.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchMetrics {
    pub backend: Backend,
    /// Total wall-clock time, including waiting for workers.
    pub total_duration: Duration,
    /// Number of kernel invocations.
    pub kernel_calls: usize,
    /// Number of output elements covered.
    pub elements: usize,
    /// Per-unit timings, in plan order.
    pub units: Vec<UnitMetrics>,
}

impl DispatchMetrics {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            total_duration: Duration::ZERO,
            kernel_calls: 0,
            elements: 0,
            units: Vec::new(),
        }
    }

    /// Records a finished unit.
    pub fn record_unit(&mut self, unit: usize, tiles: usize, calls: usize, duration: Duration) {
        self.kernel_calls += calls;
        self.units.push(UnitMetrics {
            unit,
            tiles,
            duration,
        });
    }

    /// Finalises metrics with the total wall-clock time and element count.
    pub fn finalise(&mut self, total: Duration, elements: usize) {
        self.units.sort_by_key(|u| u.unit);
        self.total_duration = total;
        self.elements = elements;
    }

    /// Sum of per-unit kernel time.
    pub fn busy_duration(&self) -> Duration {
        self.units.iter().map(|u| u.duration).sum()
    }

    /// Elements per second over the total wall-clock time.
    pub fn throughput(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs <= 0.0 || self.elements == 0 {
            return 0.0;
        }
        self.elements as f64 / secs
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Dispatch [{}]: {:.3}ms total, {} units, {} kernel calls, \
             {:.3}ms busy, {} elements ({:.1} Melem/s)",
            self.backend,
            self.total_duration.as_secs_f64() * 1000.0,
            self.units.len(),
            self.kernel_calls,
            self.busy_duration().as_secs_f64() * 1000.0,
            self.elements,
            self.throughput() / 1e6,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics() {
        let m = DispatchMetrics::new(Backend::Cpu);
        assert_eq!(m.throughput(), 0.0);
        assert_eq!(m.busy_duration(), Duration::ZERO);
    }

    #[test]
    fn test_record_out_of_order() {
        let mut m = DispatchMetrics::new(Backend::Cpu);
        m.record_unit(1, 4, 1, Duration::from_millis(3));
        m.record_unit(0, 64, 1, Duration::from_millis(5));
        m.finalise(Duration::from_millis(6), 1000);

        assert_eq!(m.units[0].unit, 0);
        assert_eq!(m.kernel_calls, 2);
        assert_eq!(m.busy_duration(), Duration::from_millis(8));
        assert!(m.throughput() > 0.0);
    }

    #[test]
    fn test_summary_format() {
        let mut m = DispatchMetrics::new(Backend::Gpu);
        m.record_unit(0, 10, 1, Duration::from_millis(1));
        m.finalise(Duration::from_millis(2), 500);
        let s = m.summary();
        assert!(s.contains("Dispatch [gpu]"));
        assert!(s.contains("1 units"));
        assert!(s.contains("500 elements"));
    }
}

//! Counters and gauges for supervisor observability.
//!
//! The controller owns a [`BoilerMetrics`] value and increments it as events
//! occur; readers take a [`MetricsSnapshot`] for rendering. No exporter is
//! wired here; the counters are the stable surface.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter that only increases.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A gauge that can move both ways.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn set(&self, v: u64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Central metrics collection for the supervisor.
#[derive(Debug, Default)]
pub struct BoilerMetrics {
    /// Cycles processed, including emergency cycles.
    pub cycles_total: Counter,

    /// Structurally invalid inbound batches.
    pub transmission_failures: Counter,

    /// Pump-state mismatches detected.
    pub pump_faults: Counter,

    /// Pump-controller mismatches detected.
    pub pump_control_faults: Counter,

    /// Steam-sensor inconsistencies detected.
    pub steam_faults: Counter,

    /// Water-level sensor faults detected (rescue entries).
    pub level_faults: Counter,

    /// Repair notices applied (returns to normal).
    pub repairs_applied: Counter,

    /// OPEN_PUMP / CLOSE_PUMP commands emitted by the selector.
    pub pump_commands: Counter,

    /// Transitions into the terminal emergency-stop mode.
    pub emergency_stops: Counter,

    /// Intended open pumps after the latest cycle.
    pub active_pumps: Gauge,
}

impl BoilerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every metric.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_total: self.cycles_total.get(),
            transmission_failures: self.transmission_failures.get(),
            pump_faults: self.pump_faults.get(),
            pump_control_faults: self.pump_control_faults.get(),
            steam_faults: self.steam_faults.get(),
            level_faults: self.level_faults.get(),
            repairs_applied: self.repairs_applied.get(),
            pump_commands: self.pump_commands.get(),
            emergency_stops: self.emergency_stops.get(),
            active_pumps: self.active_pumps.get(),
        }
    }
}

/// Plain-value view of [`BoilerMetrics`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_total: u64,
    pub transmission_failures: u64,
    pub pump_faults: u64,
    pub pump_control_faults: u64,
    pub steam_faults: u64,
    pub level_faults: u64,
    pub repairs_applied: u64,
    pub pump_commands: u64,
    pub emergency_stops: u64,
    pub active_pumps: u64,
}

//! Supervisory state owned by the mode controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supervisory state of the controller.
///
/// `EmergencyStop` is terminal: the controller never leaves it on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    Waiting,
    Ready,
    Normal,
    Degraded,
    Rescue,
    EmergencyStop,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatingMode::Waiting => "WAITING",
            OperatingMode::Ready => "READY",
            OperatingMode::Normal => "NORMAL",
            OperatingMode::Degraded => "DEGRADED",
            OperatingMode::Rescue => "RESCUE",
            OperatingMode::EmergencyStop => "EMERGENCY_STOP",
        };
        f.write_str(name)
    }
}

/// Classification of the current degradation, valid only while the
/// controller is in `Degraded` or `Rescue`. The failed pump index travels on
/// the variant that needs it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Failure {
    PumpState { pump: usize },
    PumpControlState { pump: usize },
    SteamLevel,
    WaterLevel,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::PumpState { pump } => write!(f, "PUMP_STATE({pump})"),
            Failure::PumpControlState { pump } => write!(f, "PUMP_CONTROL_STATE({pump})"),
            Failure::SteamLevel => f.write_str("STEAM_LEVEL"),
            Failure::WaterLevel => f.write_str("WATER_LEVEL"),
        }
    }
}

/// Mutable controller state, created at construction and mutated exclusively
/// by the mode controller within one cycle.
///
/// Invariant: `active_pumps` always equals the number of `true` entries in
/// `pump_open` between cycles.
#[derive(Clone, Debug)]
pub struct ControllerState {
    /// Supervisory mode, initially `Waiting`.
    pub mode: OperatingMode,

    /// Current degradation, `None` while healthy.
    pub failure: Option<Failure>,

    /// Latest accepted water-level reading.
    pub water_level: f64,

    /// Water-level reading of the previous cycle.
    pub prev_water_level: f64,

    /// Latest accepted steam reading.
    pub steam_level: f64,

    /// Steam reading of the previous cycle.
    pub prev_steam_level: f64,

    /// The controller's *intended* pump state; feedback wins on mismatch.
    pub pump_open: Vec<bool>,

    /// Count of `true` entries in `pump_open`.
    pub active_pumps: usize,

    /// Whether the drain valve has been opened during initialization.
    pub valve_open: bool,

    /// Set on first entry to `Normal`; gates the safety-envelope check.
    pub initialized: bool,

    /// Mid-interval prediction the selector committed to this cycle.
    pub ideal_predicted_water: f64,

    /// Mid-interval prediction of the previous cycle.
    pub prev_ideal_predicted_water: f64,
}

impl ControllerState {
    /// Fresh state for a boiler with `pump_count` pumps.
    pub fn new(pump_count: usize) -> Self {
        Self {
            mode: OperatingMode::Waiting,
            failure: None,
            water_level: 0.0,
            prev_water_level: 0.0,
            steam_level: 0.0,
            prev_steam_level: 0.0,
            pump_open: vec![false; pump_count],
            active_pumps: 0,
            valve_open: false,
            initialized: false,
            ideal_predicted_water: 0.0,
            prev_ideal_predicted_water: 0.0,
        }
    }

    /// Record a new water-level reading, rotating the previous one.
    pub fn record_water_level(&mut self, level: f64) {
        self.prev_water_level = self.water_level;
        self.water_level = level;
    }

    /// Record a new steam reading, rotating the previous one.
    pub fn record_steam_level(&mut self, steam: f64) {
        self.prev_steam_level = self.steam_level;
        self.steam_level = steam;
    }

    /// Recount `active_pumps` from the `pump_open` vector.
    pub fn recount_active_pumps(&mut self) {
        self.active_pumps = self.pump_open.iter().filter(|open| **open).count();
    }
}

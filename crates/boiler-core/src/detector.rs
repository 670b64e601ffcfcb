//! Sensor and actuator fault detection.
//!
//! Runs every control cycle outside of the initialization handshake and the
//! terminal emergency mode. The actuator and steam checks form an ordered
//! priority chain (pump state, then pump-controller state, then steam) and
//! the first match classifies the cycle's failure. The water-level sanity
//! checks always run afterwards; a safety-envelope violation overrides any
//! earlier classification and forces the emergency stop.
//!
//! On an actuator mismatch the observed feedback is ground truth: the
//! intended pump vector is corrected to match it before anything else uses
//! it.

use crate::config::BoilerCharacteristics;
use crate::mailbox::{Message, Mode, OutboundMailbox};
use crate::metrics::BoilerMetrics;
use crate::state::{ControllerState, Failure, OperatingMode};
use crate::transmission::CycleInputs;
use tracing::{error, warn};

/// Index of the first pump whose observed feedback disagrees with the
/// intended state.
fn first_mismatch(intended: &[bool], observed: &[bool]) -> Option<usize> {
    intended
        .iter()
        .zip(observed.iter())
        .position(|(intended, observed)| intended != observed)
}

/// Inspect the cycle's feedback against the controller's expectations.
///
/// Mutates mode, failure classification and the intended pump vector, and
/// emits the corresponding detection messages. Returns whether every
/// component checked out healthy; an unhealthy cycle skips pump selection.
pub(crate) fn run<O>(
    state: &mut ControllerState,
    characteristics: &BoilerCharacteristics,
    inputs: &CycleInputs,
    outbound: &mut O,
    metrics: &BoilerMetrics,
) -> bool
where
    O: OutboundMailbox + ?Sized,
{
    let mut healthy = true;
    let mut classified = false;

    if let Some(pump) = first_mismatch(&state.pump_open, &inputs.pump_states) {
        healthy = false;
        classified = true;
        state.mode = OperatingMode::Degraded;
        state.failure = Some(Failure::PumpState { pump });
        metrics.pump_faults.inc();
        warn!(pump, "pump feedback disagrees with intended state");

        outbound.send(Message::Mode(Mode::Degraded));
        outbound.send(Message::PumpFailureDetection(pump));

        // Physical state is ground truth.
        state.pump_open.copy_from_slice(&inputs.pump_states);
        state.recount_active_pumps();
        outbound.send(Message::ClosePump(pump));
    } else if let Some(pump) = first_mismatch(&state.pump_open, &inputs.pump_control_states) {
        healthy = false;
        classified = true;
        state.mode = OperatingMode::Degraded;
        state.failure = Some(Failure::PumpControlState { pump });
        metrics.pump_control_faults.inc();
        warn!(pump, "pump-controller feedback disagrees with intended state");

        outbound.send(Message::Mode(Mode::Degraded));
        outbound.send(Message::PumpControlFailureDetection(pump));

        state.pump_open.copy_from_slice(&inputs.pump_control_states);
        state.recount_active_pumps();
    } else if state.steam_level < state.prev_steam_level
        || state.steam_level > characteristics.maximal_steam_rate
    {
        healthy = false;
        classified = true;
        state.mode = OperatingMode::Degraded;
        state.failure = Some(Failure::SteamLevel);
        metrics.steam_faults.inc();
        warn!(
            steam = state.steam_level,
            prev_steam = state.prev_steam_level,
            "steam reading inconsistent"
        );

        outbound.send(Message::Mode(Mode::Degraded));
        outbound.send(Message::SteamFailureDetection);
    }

    // Water-level sanity is always evaluated, whatever the chain found.
    let water = state.water_level;
    if state.initialized
        && ((water > 0.0 && water < characteristics.minimal_limit_level)
            || water > characteristics.maximal_limit_level)
    {
        healthy = false;
        state.mode = OperatingMode::EmergencyStop;
        error!(water, "water level outside the safety envelope");
    } else if water < 0.0 || water >= characteristics.capacity {
        healthy = false;
        state.mode = OperatingMode::Rescue;
        if !classified {
            state.failure = Some(Failure::WaterLevel);
        }
        metrics.level_faults.inc();
        warn!(water, "water-level reading out of physical range");

        outbound.send(Message::Mode(Mode::Rescue));
        outbound.send(Message::LevelFailureDetection);
    }

    healthy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> BoilerCharacteristics {
        BoilerCharacteristics::builder()
            .capacity(1000.0)
            .limit_levels(50.0, 800.0)
            .normal_levels(200.0, 600.0)
            .maximal_steam_rate(5.0)
            .uniform_pumps(2, 10.0)
            .build()
            .expect("reference characteristics")
    }

    fn normal_state() -> ControllerState {
        let mut state = ControllerState::new(2);
        state.mode = OperatingMode::Normal;
        state.initialized = true;
        state.water_level = 400.0;
        state
    }

    fn inputs(state: &ControllerState) -> CycleInputs {
        CycleInputs {
            water_level: state.water_level,
            steam_level: state.steam_level,
            pump_states: state.pump_open.clone(),
            pump_control_states: state.pump_open.clone(),
        }
    }

    #[test]
    fn healthy_cycle_changes_nothing() {
        let characteristics = reference();
        let mut state = normal_state();
        let inputs = inputs(&state);
        let mut outbound = Vec::new();

        let healthy = run(
            &mut state,
            &characteristics,
            &inputs,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert!(healthy);
        assert_eq!(state.mode, OperatingMode::Normal);
        assert_eq!(state.failure, None);
        assert!(outbound.is_empty());
    }

    #[test]
    fn pump_mismatch_trusts_feedback_and_closes_the_pump() {
        let characteristics = reference();
        let mut state = normal_state();
        state.pump_open = vec![true, true];
        state.active_pumps = 2;

        let mut cycle = inputs(&state);
        cycle.pump_states = vec![false, true];
        let mut outbound = Vec::new();

        let healthy = run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert!(!healthy);
        assert_eq!(state.mode, OperatingMode::Degraded);
        assert_eq!(state.failure, Some(Failure::PumpState { pump: 0 }));
        assert_eq!(state.pump_open, vec![false, true]);
        assert_eq!(state.active_pumps, 1);
        assert_eq!(
            outbound,
            vec![
                Message::Mode(Mode::Degraded),
                Message::PumpFailureDetection(0),
                Message::ClosePump(0),
            ]
        );
    }

    #[test]
    fn pump_fault_outranks_controller_fault() {
        let characteristics = reference();
        let mut state = normal_state();
        state.pump_open = vec![true, true];
        state.active_pumps = 2;

        let mut cycle = inputs(&state);
        cycle.pump_states = vec![true, false];
        cycle.pump_control_states = vec![false, true];
        let mut outbound = Vec::new();

        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert_eq!(state.failure, Some(Failure::PumpState { pump: 1 }));
    }

    #[test]
    fn controller_mismatch_corrects_without_closing() {
        let characteristics = reference();
        let mut state = normal_state();

        let mut cycle = inputs(&state);
        cycle.pump_control_states = vec![true, false];
        let mut outbound = Vec::new();

        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert_eq!(state.mode, OperatingMode::Degraded);
        assert_eq!(state.failure, Some(Failure::PumpControlState { pump: 0 }));
        assert_eq!(state.pump_open, vec![true, false]);
        assert_eq!(state.active_pumps, 1);
        assert_eq!(
            outbound,
            vec![
                Message::Mode(Mode::Degraded),
                Message::PumpControlFailureDetection(0),
            ]
        );
    }

    #[test]
    fn falling_or_excessive_steam_is_a_fault() {
        let characteristics = reference();

        let mut state = normal_state();
        state.prev_steam_level = 3.0;
        state.steam_level = 2.0;
        let cycle = inputs(&state);
        let mut outbound = Vec::new();
        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert_eq!(state.failure, Some(Failure::SteamLevel));
        assert_eq!(
            outbound,
            vec![Message::Mode(Mode::Degraded), Message::SteamFailureDetection]
        );

        let mut state = normal_state();
        state.steam_level = 6.0;
        let cycle = inputs(&state);
        let mut outbound = Vec::new();
        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert_eq!(state.failure, Some(Failure::SteamLevel));
    }

    #[test]
    fn envelope_violation_forces_emergency_stop() {
        let characteristics = reference();
        for water in [30.0, 850.0] {
            let mut state = normal_state();
            state.water_level = water;
            let cycle = inputs(&state);
            let mut outbound = Vec::new();

            let healthy = run(
                &mut state,
                &characteristics,
                &cycle,
                &mut outbound,
                &BoilerMetrics::new(),
            );
            assert!(!healthy);
            assert_eq!(state.mode, OperatingMode::EmergencyStop);
            assert!(outbound.is_empty());
        }
    }

    #[test]
    fn envelope_overrides_out_of_range_reading() {
        // 1500 violates both the envelope and the capacity bound; safety wins.
        let characteristics = reference();
        let mut state = normal_state();
        state.water_level = 1500.0;
        let cycle = inputs(&state);
        let mut outbound = Vec::new();

        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert_eq!(state.mode, OperatingMode::EmergencyStop);
        assert!(outbound.is_empty());
    }

    #[test]
    fn negative_reading_enters_rescue() {
        let characteristics = reference();
        let mut state = normal_state();
        state.water_level = -1.0;
        let cycle = inputs(&state);
        let mut outbound = Vec::new();

        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        assert_eq!(state.mode, OperatingMode::Rescue);
        assert_eq!(state.failure, Some(Failure::WaterLevel));
        assert_eq!(
            outbound,
            vec![Message::Mode(Mode::Rescue), Message::LevelFailureDetection]
        );
    }

    #[test]
    fn pump_fault_keeps_priority_over_rescue_classification() {
        let characteristics = reference();
        let mut state = normal_state();
        state.pump_open = vec![true, true];
        state.active_pumps = 2;
        state.water_level = -5.0;

        let mut cycle = inputs(&state);
        cycle.pump_states = vec![false, true];
        let mut outbound = Vec::new();

        run(
            &mut state,
            &characteristics,
            &cycle,
            &mut outbound,
            &BoilerMetrics::new(),
        );
        // Rescue mode, but the recorded failure stays with the pump.
        assert_eq!(state.mode, OperatingMode::Rescue);
        assert_eq!(state.failure, Some(Failure::PumpState { pump: 0 }));
    }
}

//! Universal properties of the supervisor, checked over randomized cycles.

use boiler_core::{
    predictor, selector, BoilerCharacteristics, BoilerController, Message, Mode, OperatingMode,
};
use proptest::prelude::*;

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

fn controller() -> BoilerController {
    BoilerController::new(reference()).expect("controller")
}

fn sensor_batch(level: f64, steam: f64, pumps: [bool; 2], controls: [bool; 2]) -> Vec<Message> {
    vec![
        Message::Level(level),
        Message::Steam(steam),
        Message::PumpState(0, pumps[0]),
        Message::PumpState(1, pumps[1]),
        Message::PumpControlState(0, controls[0]),
        Message::PumpControlState(1, controls[1]),
    ]
}

fn to_normal(controller: &mut BoilerController) {
    let mut outbound = Vec::new();
    let mut batch = sensor_batch(400.0, 0.0, [false; 2], [false; 2]);
    batch.push(Message::SteamBoilerWaiting);
    controller.clock(&batch, &mut outbound);

    let mut batch = sensor_batch(400.0, 0.0, [false; 2], [false; 2]);
    batch.push(Message::PhysicalUnitsReady);
    controller.clock(&batch, &mut outbound);
    assert_eq!(controller.state().mode, OperatingMode::Normal);
}

/// One randomized but structurally valid cycle worth of input.
#[derive(Clone, Debug)]
struct CycleScript {
    level: f64,
    steam: f64,
    pumps: [bool; 2],
    controls: [bool; 2],
    waiting_handshake: bool,
    units_ready: bool,
}

fn cycle_script() -> impl Strategy<Value = CycleScript> {
    (
        -20.0f64..1100.0,
        // A cold boiler (steam exactly 0) must be reachable or the scripts
        // would never leave WAITING.
        prop_oneof![Just(0.0f64), -2.0f64..8.0],
        any::<[bool; 2]>(),
        any::<[bool; 2]>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(level, steam, pumps, controls, waiting_handshake, units_ready)| CycleScript {
                level,
                steam,
                pumps,
                controls,
                waiting_handshake,
                units_ready,
            },
        )
}

fn script_batch(script: &CycleScript) -> Vec<Message> {
    let mut batch = sensor_batch(script.level, script.steam, script.pumps, script.controls);
    if script.waiting_handshake {
        batch.push(Message::SteamBoilerWaiting);
    }
    if script.units_ready {
        batch.push(Message::PhysicalUnitsReady);
    }
    batch
}

proptest! {
    // P2 + P3: the trailing message always names the cycle outcome, and the
    // active-pump count always equals the intended-open popcount.
    #[test]
    fn trailing_mode_and_pump_invariant_hold(scripts in proptest::collection::vec(cycle_script(), 1..40)) {
        let mut controller = controller();
        for script in &scripts {
            let mut outbound = Vec::new();
            controller.clock(&script_batch(script), &mut outbound);

            let open_count = controller
                .state()
                .pump_open
                .iter()
                .filter(|open| **open)
                .count();
            prop_assert_eq!(controller.state().active_pumps, open_count);

            let trailing = outbound.last().expect("every cycle emits a MODE message");
            if controller.state().mode == OperatingMode::EmergencyStop {
                prop_assert_eq!(trailing, &Message::Mode(Mode::EmergencyStop));
            } else {
                prop_assert_eq!(trailing, &Message::Mode(Mode::Initialisation));
            }
        }
    }

    // P1: once stopped, every subsequent cycle emits exactly the stop notice.
    #[test]
    fn emergency_stop_is_terminal(scripts in proptest::collection::vec(cycle_script(), 0..20)) {
        let mut controller = controller();
        let mut outbound = Vec::new();
        let empty: Vec<Message> = Vec::new();
        controller.clock(&empty, &mut outbound);
        prop_assert_eq!(controller.state().mode, OperatingMode::EmergencyStop);

        for script in &scripts {
            let mut outbound = Vec::new();
            controller.clock(&script_batch(script), &mut outbound);
            prop_assert_eq!(outbound, vec![Message::Mode(Mode::EmergencyStop)]);
        }
    }

    // P4: a structurally deficient batch forces the emergency stop.
    #[test]
    fn transmission_gate_stops_the_cycle(script in cycle_script(), defect in 0usize..4) {
        let mut batch = script_batch(&script);
        match defect {
            0 => batch.retain(|m| !matches!(m, Message::Level(_))),
            1 => batch.retain(|m| !matches!(m, Message::Steam(_))),
            2 => batch.retain(|m| !matches!(m, Message::PumpState(1, _))),
            _ => batch.push(Message::PumpControlState(2, false)),
        }

        let mut controller = controller();
        let mut outbound = Vec::new();
        controller.clock(&batch, &mut outbound);
        prop_assert_eq!(controller.state().mode, OperatingMode::EmergencyStop);
        prop_assert_eq!(outbound, vec![Message::Mode(Mode::EmergencyStop)]);
    }

    // P5: the chosen count minimizes the mid-point distance, ties to the
    // smallest count.
    #[test]
    fn selector_is_optimal(
        water in 0.0f64..1000.0,
        steam in 0.0f64..5.0,
        capacities in proptest::collection::vec(1.0f64..20.0, 1..5),
    ) {
        let characteristics = BoilerCharacteristics::builder()
            .capacity(1000.0)
            .limit_levels(50.0, 800.0)
            .normal_levels(200.0, 600.0)
            .maximal_steam_rate(5.0)
            .pump_capacities(capacities)
            .build()
            .expect("characteristics");

        let target = characteristics.normal_mid_point();
        let predictions = predictor::predict(&characteristics, water, steam);
        let chosen = selector::ideal_pump_count(&predictions, target);

        let chosen_distance = (predictions[chosen].mid - target).abs();
        for (count, prediction) in predictions.iter().enumerate() {
            let distance = (prediction.mid - target).abs();
            prop_assert!(chosen_distance <= distance);
            if count < chosen {
                // Anything before the winner must be strictly worse.
                prop_assert!(distance > chosen_distance);
            }
        }
    }

    // P6: after a pump-state mismatch, the intended vector equals the
    // observed feedback for the remainder of the cycle.
    #[test]
    fn feedback_wins_on_pump_mismatch(pumps in any::<[bool; 2]>()) {
        prop_assume!(pumps != [true, true]);

        let mut controller = controller();
        to_normal(&mut controller);
        // Open both pumps, then feed back a diverging pump state.
        let mut outbound = Vec::new();
        controller.clock(
            &sensor_batch(100.0, 0.0, [false; 2], [false; 2]),
            &mut outbound,
        );
        prop_assert_eq!(&controller.state().pump_open, &vec![true, true]);

        let mut outbound = Vec::new();
        controller.clock(
            &sensor_batch(150.0, 0.0, pumps, [true; 2]),
            &mut outbound,
        );

        prop_assert_eq!(&controller.state().pump_open, &pumps.to_vec());
        prop_assert_eq!(controller.state().mode, OperatingMode::Degraded);

        let first_divergent = if pumps[0] { 1 } else { 0 };
        prop_assert!(outbound.contains(&Message::ClosePump(first_divergent)));
    }

    // P8: once initialized, a level inside the forbidden bands ends the run.
    #[test]
    fn safety_envelope_is_enforced(
        level in prop_oneof![0.001f64..49.999, 800.001f64..2000.0],
    ) {
        let mut controller = controller();
        to_normal(&mut controller);

        let mut outbound = Vec::new();
        controller.clock(
            &sensor_batch(level, 0.0, [false; 2], [false; 2]),
            &mut outbound,
        );
        prop_assert_eq!(controller.state().mode, OperatingMode::EmergencyStop);
        prop_assert_eq!(
            outbound.last(),
            Some(&Message::Mode(Mode::EmergencyStop))
        );
    }
}

// P7 is exercised class-by-class in `e2e_cycles.rs`; this variant checks the
// repair notice works from the randomized degraded states the scripts reach.
proptest! {
    #[test]
    fn repair_notice_restores_normal(pumps in any::<[bool; 2]>()) {
        prop_assume!(pumps != [false, false]);

        let mut controller = controller();
        to_normal(&mut controller);

        // Diverging pump feedback while everything is intended closed.
        let mut outbound = Vec::new();
        controller.clock(
            &sensor_batch(400.0, 0.0, pumps, [false; 2]),
            &mut outbound,
        );
        prop_assert_eq!(controller.state().mode, OperatingMode::Degraded);

        // Matching feedback plus the repair notice: back to normal.
        let mut batch = sensor_batch(400.0, 0.0, pumps, pumps);
        batch.push(Message::PumpRepaired(0));
        let mut outbound = Vec::new();
        controller.clock(&batch, &mut outbound);

        prop_assert_eq!(controller.state().mode, OperatingMode::Normal);
        prop_assert_eq!(controller.state().failure, None);
        prop_assert!(outbound.contains(&Message::Mode(Mode::Normal)));
    }
}

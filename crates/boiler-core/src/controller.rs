//! The mode controller: the supervisor's top-level state machine.
//!
//! One [`BoilerController::clock`] invocation per cycle is the only entry
//! point; it runs to completion before the next cycle and never blocks. The
//! per-cycle output order is fixed: an early emergency announcement when the
//! batch itself is unusable, otherwise fault-detection messages (with any
//! corrective pump close), mode-transition messages from initialization or
//! repair handling, pump open/close deltas from the selector, and finally
//! the trailing `MODE` message every cycle carries.

use crate::config::BoilerCharacteristics;
use crate::cycle_log::{CycleRecord, CycleRecorder};
use crate::mailbox::{
    extract_unique, InboundMailbox, Message, MessageKind, Mode, OutboundMailbox,
};
use crate::metrics::BoilerMetrics;
use crate::state::{ControllerState, Failure, OperatingMode};
use crate::transmission::{self, CycleInputs};
use crate::{detector, predictor, selector, Result};
use tracing::{debug, error, info, instrument, warn};

/// Outbound sink that counts what passes through, so the cycle record can
/// report how many messages the cycle produced.
struct CountingOutbound<'a, O: OutboundMailbox + ?Sized> {
    inner: &'a mut O,
    sent: usize,
}

impl<O: OutboundMailbox + ?Sized> OutboundMailbox for CountingOutbound<'_, O> {
    fn send(&mut self, message: Message) {
        self.sent += 1;
        self.inner.send(message);
    }
}

/// Periodic supervisor for one steam boiler.
pub struct BoilerController {
    characteristics: BoilerCharacteristics,
    state: ControllerState,
    metrics: BoilerMetrics,
    recorder: Option<Box<dyn CycleRecorder>>,
    cycle: u64,
}

impl BoilerController {
    /// Construct a controller for the given boiler.
    ///
    /// Rejects characteristics that fail [`BoilerCharacteristics::validate`].
    pub fn new(characteristics: BoilerCharacteristics) -> Result<Self> {
        characteristics.validate()?;
        let pump_count = characteristics.number_of_pumps();
        Ok(Self {
            characteristics,
            state: ControllerState::new(pump_count),
            metrics: BoilerMetrics::new(),
            recorder: None,
            cycle: 0,
        })
    }

    /// Attach a cycle recorder. Recording is best-effort: errors are logged
    /// and never fail the cycle.
    pub fn with_recorder(mut self, recorder: Box<dyn CycleRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// The boiler characteristics this controller was built with.
    pub fn characteristics(&self) -> &BoilerCharacteristics {
        &self.characteristics
    }

    /// Read-only view of the controller state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Supervisor metrics.
    pub fn metrics(&self) -> &BoilerMetrics {
        &self.metrics
    }

    /// Human-readable status line: the current mode name.
    pub fn status_message(&self) -> String {
        self.state.mode.to_string()
    }

    /// Process one clock signal.
    ///
    /// Reads the cycle's inbound batch and appends the cycle's commands to
    /// the outbound batch. Always completes; every fault condition is
    /// reflected in a mode change, a detection message, or both.
    #[instrument(name = "boiler_clock", skip_all, fields(cycle = self.cycle + 1, mode = %self.state.mode))]
    pub fn clock<I, O>(&mut self, inbound: &I, outbound: &mut O)
    where
        I: InboundMailbox + ?Sized,
        O: OutboundMailbox + ?Sized,
    {
        self.cycle += 1;
        self.metrics.cycles_total.inc();
        let entered_mode = self.state.mode;

        let mut outbound = CountingOutbound {
            inner: outbound,
            sent: 0,
        };
        self.run_cycle(inbound, &mut outbound);

        if self.state.mode == OperatingMode::EmergencyStop
            && entered_mode != OperatingMode::EmergencyStop
        {
            self.metrics.emergency_stops.inc();
        }
        self.metrics.active_pumps.set(self.state.active_pumps as u64);

        if let Some(recorder) = &self.recorder {
            let record = CycleRecord {
                cycle: self.cycle,
                entered_mode,
                exited_mode: self.state.mode,
                failure: self.state.failure,
                water_level: self.state.water_level,
                steam_level: self.state.steam_level,
                active_pumps: self.state.active_pumps,
                valve_open: self.state.valve_open,
                sent: outbound.sent,
            };
            if let Err(e) = recorder.record(&record) {
                warn!(error = %e, "cycle recorder failed");
            }
        }
    }

    fn run_cycle<I, O>(&mut self, inbound: &I, outbound: &mut O)
    where
        I: InboundMailbox + ?Sized,
        O: OutboundMailbox + ?Sized,
    {
        // Terminal mode: re-announce the stop and nothing else.
        if self.state.mode == OperatingMode::EmergencyStop {
            outbound.send(Message::Mode(Mode::EmergencyStop));
            return;
        }

        let pump_count = self.characteristics.number_of_pumps();
        let Some(inputs) = transmission::extract_cycle_inputs(inbound, pump_count) else {
            error!("transmission failure: inbound batch is structurally invalid");
            self.metrics.transmission_failures.inc();
            self.state.mode = OperatingMode::EmergencyStop;
            outbound.send(Message::Mode(Mode::EmergencyStop));
            return;
        };

        // Two strictly negative sensors cannot be a single bad reading.
        if inputs.water_level < 0.0 && inputs.steam_level < 0.0 {
            error!(
                water = inputs.water_level,
                steam = inputs.steam_level,
                "both sensors read negative"
            );
            self.state.mode = OperatingMode::EmergencyStop;
        } else {
            match self.state.mode {
                OperatingMode::Waiting => self.waiting_cycle(inbound, &inputs, outbound),
                OperatingMode::Ready => self.ready_cycle(inbound, &inputs, outbound),
                OperatingMode::Normal | OperatingMode::Degraded | OperatingMode::Rescue => {
                    self.control_cycle(inbound, &inputs, outbound)
                }
                OperatingMode::EmergencyStop => unreachable!("handled above"),
            }
        }

        if self.state.mode == OperatingMode::EmergencyStop {
            outbound.send(Message::Mode(Mode::EmergencyStop));
        } else {
            outbound.send(Message::Mode(Mode::Initialisation));
        }
    }

    /// WAITING: wait for the plant's handshake, then steer the water level
    /// into the normal band before declaring the program ready.
    fn waiting_cycle<I, O>(&mut self, inbound: &I, inputs: &CycleInputs, outbound: &mut O)
    where
        I: InboundMailbox + ?Sized,
        O: OutboundMailbox + ?Sized,
    {
        self.state.initialized = false;
        if extract_unique(inbound, MessageKind::SteamBoilerWaiting).is_none() {
            return;
        }

        // The boiler must be cold and the level reading physically possible.
        if inputs.steam_level != 0.0
            || inputs.water_level < 0.0
            || inputs.water_level > self.characteristics.capacity
        {
            error!(
                water = inputs.water_level,
                steam = inputs.steam_level,
                "sensor check failed during initialization"
            );
            self.state.mode = OperatingMode::EmergencyStop;
            return;
        }

        self.state.record_water_level(inputs.water_level);

        if self.state.water_level > self.characteristics.maximal_normal_level
            && !self.state.valve_open
        {
            self.state.valve_open = true;
            outbound.send(Message::Valve);
        } else if self.state.water_level < self.characteristics.minimal_normal_level {
            for pump in 0..self.characteristics.number_of_pumps() {
                outbound.send(Message::OpenPump(pump));
                self.state.pump_open[pump] = true;
            }
            self.state.recount_active_pumps();
        }

        if self.state.water_level >= self.characteristics.minimal_normal_level
            && self.state.water_level <= self.characteristics.maximal_normal_level
        {
            info!(water = self.state.water_level, "water level in band, program ready");
            self.state.mode = OperatingMode::Ready;
            outbound.send(Message::ProgramReady);
        }
    }

    /// READY: watch the steam sensor and wait for the physical units.
    fn ready_cycle<I, O>(&mut self, inbound: &I, inputs: &CycleInputs, outbound: &mut O)
    where
        I: InboundMailbox + ?Sized,
        O: OutboundMailbox + ?Sized,
    {
        self.state.initialized = false;
        self.state.record_steam_level(inputs.steam_level);

        if self.state.steam_level < self.state.prev_steam_level
            || self.state.steam_level > self.characteristics.maximal_steam_rate
        {
            warn!(steam = self.state.steam_level, "steam fault before startup");
            self.state.mode = OperatingMode::Degraded;
            self.state.failure = Some(Failure::SteamLevel);
            self.metrics.steam_faults.inc();
            outbound.send(Message::Mode(Mode::Degraded));
            outbound.send(Message::SteamFailureDetection);
        }

        if extract_unique(inbound, MessageKind::PhysicalUnitsReady).is_some() {
            info!("physical units ready, entering normal operation");
            self.state.mode = OperatingMode::Normal;
            self.state.failure = None;
            self.state.initialized = true;
            outbound.send(Message::Mode(Mode::Normal));
        }
    }

    /// NORMAL / DEGRADED / RESCUE: ingest readings, detect faults, apply any
    /// repair notice, and when everything checked out, reconcile the pumps
    /// toward the predicted ideal count.
    fn control_cycle<I, O>(&mut self, inbound: &I, inputs: &CycleInputs, outbound: &mut O)
    where
        I: InboundMailbox + ?Sized,
        O: OutboundMailbox + ?Sized,
    {
        self.state.record_steam_level(inputs.steam_level);
        self.state.record_water_level(inputs.water_level);

        let healthy = detector::run(
            &mut self.state,
            &self.characteristics,
            inputs,
            outbound,
            &self.metrics,
        );

        if matches!(
            self.state.mode,
            OperatingMode::Degraded | OperatingMode::Rescue
        ) {
            self.handle_repair(inbound, outbound);
        }

        if healthy {
            self.run_pump_selection(inputs, outbound);
        } else {
            debug!("skipping pump selection on an unhealthy cycle");
        }
    }

    /// Apply the acknowledgement/repair protocol for the current failure.
    ///
    /// The acknowledgement closes the report loop and carries no state
    /// change; the repair notice returns the controller to normal.
    fn handle_repair<I, O>(&mut self, inbound: &I, outbound: &mut O)
    where
        I: InboundMailbox + ?Sized,
        O: OutboundMailbox + ?Sized,
    {
        let Some(failure) = self.state.failure else {
            return;
        };

        let (acknowledgement, repair) = match failure {
            Failure::PumpState { .. } => (
                MessageKind::PumpRepairedAcknowledgement,
                MessageKind::PumpRepaired,
            ),
            Failure::PumpControlState { .. } => (
                MessageKind::PumpControlFailureAcknowledgement,
                MessageKind::PumpRepaired,
            ),
            Failure::SteamLevel => (
                MessageKind::SteamOutcomeFailureAcknowledgement,
                MessageKind::SteamRepaired,
            ),
            Failure::WaterLevel => (
                MessageKind::LevelFailureAcknowledgement,
                MessageKind::LevelRepaired,
            ),
        };

        if extract_unique(inbound, acknowledgement).is_some() {
            debug!(%failure, "failure report acknowledged");
        }

        if extract_unique(inbound, repair).is_some() {
            info!(%failure, "repair notice received, returning to normal");
            self.metrics.repairs_applied.inc();
            self.state.mode = OperatingMode::Normal;
            self.state.failure = None;
            self.state.initialized = true;
            outbound.send(Message::Mode(Mode::Normal));
        }
    }

    /// Predict, choose the ideal pump count, and emit the open/close deltas
    /// that reconcile the intended pump state with it.
    fn run_pump_selection<O>(&mut self, inputs: &CycleInputs, outbound: &mut O)
    where
        O: OutboundMailbox + ?Sized,
    {
        self.state.recount_active_pumps();

        let predictions = predictor::predict(
            &self.characteristics,
            self.state.water_level,
            self.state.steam_level,
        );
        let target =
            selector::ideal_pump_count(&predictions, self.characteristics.normal_mid_point());

        self.state.prev_ideal_predicted_water = self.state.ideal_predicted_water;
        self.state.ideal_predicted_water = predictions[target].mid;
        debug!(
            target,
            active = self.state.active_pumps,
            predicted = self.state.ideal_predicted_water,
            "pump selection"
        );

        if target > self.state.active_pumps {
            for pump in 0..self.characteristics.number_of_pumps() {
                if self.state.active_pumps == target {
                    break;
                }
                if !inputs.pump_control_states[pump] {
                    outbound.send(Message::OpenPump(pump));
                    self.metrics.pump_commands.inc();
                    self.state.pump_open[pump] = true;
                    self.state.active_pumps += 1;
                }
            }
        } else if target < self.state.active_pumps {
            for pump in 0..self.characteristics.number_of_pumps() {
                if self.state.active_pumps == target {
                    break;
                }
                if inputs.pump_control_states[pump] {
                    outbound.send(Message::ClosePump(pump));
                    self.metrics.pump_commands.inc();
                    self.state.pump_open[pump] = false;
                    self.state.active_pumps -= 1;
                }
            }
        }
    }
}

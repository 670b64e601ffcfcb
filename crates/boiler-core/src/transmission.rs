//! Transmission-layer validation of the inbound batch.
//!
//! A cycle can only drive a control decision when the batch carries exactly
//! one level reading, exactly one steam reading, and one pump-state plus one
//! pump-control-state report per installed pump. Anything less (or more, for
//! the singleton kinds) is a transmission failure, which is fatal for the
//! cycle.

use crate::mailbox::{extract_all, extract_unique, InboundMailbox, Message, MessageKind};

/// Structurally validated sensor and feedback inputs for one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleInputs {
    /// Reported drum water level.
    pub water_level: f64,

    /// Reported steam output.
    pub steam_level: f64,

    /// Observed open/closed state per pump, indexed positionally.
    pub pump_states: Vec<bool>,

    /// Observed open/closed state per pump controller, indexed positionally.
    pub pump_control_states: Vec<bool>,
}

/// Validate the inbound batch and extract the cycle's inputs.
///
/// Returns `None` on transmission failure: level or steam absent (missing or
/// duplicated), or either pump feedback array not matching `pump_count`.
pub fn extract_cycle_inputs<I>(inbound: &I, pump_count: usize) -> Option<CycleInputs>
where
    I: InboundMailbox + ?Sized,
{
    let water_level = match extract_unique(inbound, MessageKind::Level) {
        Some(Message::Level(value)) => *value,
        _ => return None,
    };
    let steam_level = match extract_unique(inbound, MessageKind::Steam) {
        Some(Message::Steam(value)) => *value,
        _ => return None,
    };

    let pump_states: Vec<bool> = extract_all(inbound, MessageKind::PumpState)
        .iter()
        .filter_map(|message| match message {
            Message::PumpState(_, open) => Some(*open),
            _ => None,
        })
        .collect();
    if pump_states.len() != pump_count {
        return None;
    }

    let pump_control_states: Vec<bool> = extract_all(inbound, MessageKind::PumpControlState)
        .iter()
        .filter_map(|message| match message {
            Message::PumpControlState(_, open) => Some(*open),
            _ => None,
        })
        .collect();
    if pump_control_states.len() != pump_count {
        return None;
    }

    Some(CycleInputs {
        water_level,
        steam_level,
        pump_states,
        pump_control_states,
    })
}

//! Message vocabulary and the mailbox capability boundary.
//!
//! The mailbox interface is the only polymorphism boundary of the core: an
//! ordered, read-only inbound batch and an append-only outbound batch, both
//! scoped to a single cycle. The controller never reads back what it sent.
//!
//! The classifier operations [`extract_unique`] and [`extract_all`] partition
//! an inbound batch by [`MessageKind`]. Uniqueness is fail-closed: zero
//! matches and multiple matches are both reported as *absent*.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode announced on the wire via `MODE` messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Initialisation,
    Normal,
    Degraded,
    Rescue,
    EmergencyStop,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Initialisation => "INITIALISATION",
            Mode::Normal => "NORMAL",
            Mode::Degraded => "DEGRADED",
            Mode::Rescue => "RESCUE",
            Mode::EmergencyStop => "EMERGENCY_STOP",
        };
        f.write_str(name)
    }
}

/// A single message exchanged with the physical units.
///
/// Payloads travel on the variant that needs them; pump-indexed messages
/// carry the pump index, sensor messages carry the reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    // Plant -> controller.
    Level(f64),
    Steam(f64),
    PumpState(usize, bool),
    PumpControlState(usize, bool),
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    PumpRepaired(usize),
    PumpRepairedAcknowledgement(usize),
    PumpControlFailureAcknowledgement(usize),
    SteamRepaired,
    SteamOutcomeFailureAcknowledgement,
    LevelRepaired,
    LevelFailureAcknowledgement,

    // Controller -> plant.
    Mode(Mode),
    OpenPump(usize),
    ClosePump(usize),
    Valve,
    ProgramReady,
    PumpFailureDetection(usize),
    PumpControlFailureDetection(usize),
    SteamFailureDetection,
    LevelFailureDetection,
}

/// Discriminant of a [`Message`], used by the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Level,
    Steam,
    PumpState,
    PumpControlState,
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    PumpRepaired,
    PumpRepairedAcknowledgement,
    PumpControlFailureAcknowledgement,
    SteamRepaired,
    SteamOutcomeFailureAcknowledgement,
    LevelRepaired,
    LevelFailureAcknowledgement,
    Mode,
    OpenPump,
    ClosePump,
    Valve,
    ProgramReady,
    PumpFailureDetection,
    PumpControlFailureDetection,
    SteamFailureDetection,
    LevelFailureDetection,
}

impl Message {
    /// The kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Level(_) => MessageKind::Level,
            Message::Steam(_) => MessageKind::Steam,
            Message::PumpState(_, _) => MessageKind::PumpState,
            Message::PumpControlState(_, _) => MessageKind::PumpControlState,
            Message::SteamBoilerWaiting => MessageKind::SteamBoilerWaiting,
            Message::PhysicalUnitsReady => MessageKind::PhysicalUnitsReady,
            Message::PumpRepaired(_) => MessageKind::PumpRepaired,
            Message::PumpRepairedAcknowledgement(_) => MessageKind::PumpRepairedAcknowledgement,
            Message::PumpControlFailureAcknowledgement(_) => {
                MessageKind::PumpControlFailureAcknowledgement
            }
            Message::SteamRepaired => MessageKind::SteamRepaired,
            Message::SteamOutcomeFailureAcknowledgement => {
                MessageKind::SteamOutcomeFailureAcknowledgement
            }
            Message::LevelRepaired => MessageKind::LevelRepaired,
            Message::LevelFailureAcknowledgement => MessageKind::LevelFailureAcknowledgement,
            Message::Mode(_) => MessageKind::Mode,
            Message::OpenPump(_) => MessageKind::OpenPump,
            Message::ClosePump(_) => MessageKind::ClosePump,
            Message::Valve => MessageKind::Valve,
            Message::ProgramReady => MessageKind::ProgramReady,
            Message::PumpFailureDetection(_) => MessageKind::PumpFailureDetection,
            Message::PumpControlFailureDetection(_) => {
                MessageKind::PumpControlFailureDetection
            }
            Message::SteamFailureDetection => MessageKind::SteamFailureDetection,
            Message::LevelFailureDetection => MessageKind::LevelFailureDetection,
        }
    }
}

impl fmt::Display for Message {
    /// Renders the protocol-level name of the message, e.g. `LEVEL_v(400)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Level(v) => write!(f, "LEVEL_v({v})"),
            Message::Steam(v) => write!(f, "STEAM_v({v})"),
            Message::PumpState(n, b) => write!(f, "PUMP_STATE_n_b({n},{b})"),
            Message::PumpControlState(n, b) => write!(f, "PUMP_CONTROL_STATE_n_b({n},{b})"),
            Message::SteamBoilerWaiting => f.write_str("STEAM_BOILER_WAITING"),
            Message::PhysicalUnitsReady => f.write_str("PHYSICAL_UNITS_READY"),
            Message::PumpRepaired(n) => write!(f, "PUMP_REPAIRED_n({n})"),
            Message::PumpRepairedAcknowledgement(n) => {
                write!(f, "PUMP_REPAIRED_ACKNOWLEDGEMENT_n({n})")
            }
            Message::PumpControlFailureAcknowledgement(n) => {
                write!(f, "PUMP_CONTROL_FAILURE_ACKNOWLEDGEMENT_n({n})")
            }
            Message::SteamRepaired => f.write_str("STEAM_REPAIRED"),
            Message::SteamOutcomeFailureAcknowledgement => {
                f.write_str("STEAM_OUTCOME_FAILURE_ACKNOWLEDGEMENT")
            }
            Message::LevelRepaired => f.write_str("LEVEL_REPAIRED"),
            Message::LevelFailureAcknowledgement => f.write_str("LEVEL_FAILURE_ACKNOWLEDGEMENT"),
            Message::Mode(m) => write!(f, "MODE_m({m})"),
            Message::OpenPump(n) => write!(f, "OPEN_PUMP_n({n})"),
            Message::ClosePump(n) => write!(f, "CLOSE_PUMP_n({n})"),
            Message::Valve => f.write_str("VALVE"),
            Message::ProgramReady => f.write_str("PROGRAM_READY"),
            Message::PumpFailureDetection(n) => write!(f, "PUMP_FAILURE_DETECTION_n({n})"),
            Message::PumpControlFailureDetection(n) => {
                write!(f, "PUMP_CONTROL_FAILURE_DETECTION_n({n})")
            }
            Message::SteamFailureDetection => f.write_str("STEAM_FAILURE_DETECTION"),
            Message::LevelFailureDetection => f.write_str("LEVEL_FAILURE_DETECTION"),
        }
    }
}

/// Read side of the cycle mailbox: an ordered batch the controller may only
/// inspect.
pub trait InboundMailbox {
    /// Number of messages in the batch.
    fn size(&self) -> usize;

    /// The `index`-th message, or `None` past the end.
    fn read(&self, index: usize) -> Option<&Message>;
}

/// Write side of the cycle mailbox: the controller appends, never reads back.
pub trait OutboundMailbox {
    /// Append one message to the outbound batch.
    fn send(&mut self, message: Message);
}

impl InboundMailbox for [Message] {
    fn size(&self) -> usize {
        self.len()
    }

    fn read(&self, index: usize) -> Option<&Message> {
        self.get(index)
    }
}

impl InboundMailbox for Vec<Message> {
    fn size(&self) -> usize {
        self.len()
    }

    fn read(&self, index: usize) -> Option<&Message> {
        self.get(index)
    }
}

impl OutboundMailbox for Vec<Message> {
    fn send(&mut self, message: Message) {
        self.push(message);
    }
}

/// Extract the sole message of `kind` from the batch.
///
/// Returns `None` both when the batch holds no message of that kind and when
/// it holds more than one; callers distinguish by context.
pub fn extract_unique<I>(inbound: &I, kind: MessageKind) -> Option<&Message>
where
    I: InboundMailbox + ?Sized,
{
    let mut found = None;
    for i in 0..inbound.size() {
        let message = inbound.read(i)?;
        if message.kind() == kind {
            if found.is_some() {
                // More than one match is indistinguishable from none.
                return None;
            }
            found = Some(message);
        }
    }
    found
}

/// Extract every message of `kind`, preserving batch order.
///
/// Pump-indexed kinds are consumed positionally: element `i` of the result
/// is taken to describe pump `i`.
pub fn extract_all<I>(inbound: &I, kind: MessageKind) -> Vec<&Message>
where
    I: InboundMailbox + ?Sized,
{
    let mut matches = Vec::new();
    for i in 0..inbound.size() {
        if let Some(message) = inbound.read(i) {
            if message.kind() == kind {
                matches.push(message);
            }
        }
    }
    matches
}

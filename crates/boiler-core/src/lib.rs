//! Control core for a steam-boiler supervisor.
//!
//! Once every fixed cycle the supervisor ingests a batch of sensor and
//! actuator-feedback messages from the physical plant and emits a batch of
//! command messages back to it. The core keeps the drum water level inside
//! the configured normal band, tolerates partial sensor and actuator
//! failures by running in degraded modes, and commands an emergency stop
//! when safety is compromised.
//!
//! The crate is purely synchronous: [`BoilerController::clock`] is the only
//! entry point and runs to completion before the next cycle. The caller owns
//! cycle cadence; the controller owns all state.

use thiserror::Error;

pub mod config;
pub mod controller;
pub mod cycle_log;
pub mod detector;
pub mod mailbox;
pub mod metrics;
pub mod predictor;
pub mod selector;
pub mod state;
pub mod transmission;

pub use config::{BoilerCharacteristics, BoilerCharacteristicsBuilder};
pub use controller::BoilerController;
pub use mailbox::{InboundMailbox, Message, MessageKind, Mode, OutboundMailbox};
pub use state::{ControllerState, Failure, OperatingMode};

/// Fixed sampling interval between successive `clock` invocations, in
/// time-units. All level predictions assume this horizon.
pub const CYCLE_SECONDS: f64 = 5.0;

/// Unified error type for the boiler control core.
///
/// The per-cycle control path never returns an error: every fault condition
/// is reflected in a mode change, a detection message, or both. Errors are
/// reserved for construction-time validation and replay-input boundaries.
#[derive(Debug, Error)]
pub enum BoilerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, BoilerError>;

//! Scenario loading and replay.
//!
//! A scenario is a JSON document carrying the boiler characteristics and the
//! inbound batch for every cycle:
//!
//! ```json
//! {
//!   "characteristics": { "capacity": 1000.0, ... },
//!   "cycles": [
//!     ["SteamBoilerWaiting", {"Level": 400.0}, {"Steam": 0.0}, ...],
//!     ...
//!   ]
//! }
//! ```
//!
//! Replay is deterministic; an emergency stop is a successfully replayed
//! outcome, not an error. Only malformed input exits non-zero.

use anyhow::{Context, Result};
use boiler_core::cycle_log::JsonlCycleLog;
use boiler_core::{BoilerCharacteristics, BoilerController, Message};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A scripted run: characteristics plus one inbound batch per cycle.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub characteristics: BoilerCharacteristics,
    pub cycles: Vec<Vec<Message>>,
}

fn load(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
    let scenario: Scenario =
        serde_json::from_str(&text).context("failed to parse scenario JSON")?;
    scenario
        .characteristics
        .validate()
        .context("invalid boiler characteristics")?;
    Ok(scenario)
}

pub fn check(path: PathBuf) -> Result<()> {
    let scenario = load(&path)?;
    println!(
        "scenario ok: {} pumps, {} cycles",
        scenario.characteristics.number_of_pumps(),
        scenario.cycles.len()
    );
    Ok(())
}

pub fn run(path: PathBuf, log: Option<PathBuf>, metrics: bool) -> Result<()> {
    let scenario = load(&path)?;
    let mut controller = BoilerController::new(scenario.characteristics)?;

    if let Some(log_path) = log {
        let recorder = JsonlCycleLog::open(&log_path)
            .with_context(|| format!("failed to open cycle log: {}", log_path.display()))?;
        controller = controller.with_recorder(Box::new(recorder));
    }

    for (index, batch) in scenario.cycles.iter().enumerate() {
        let mut outbound: Vec<Message> = Vec::new();
        controller.clock(batch, &mut outbound);

        let rendered: Vec<String> = outbound.iter().map(ToString::to_string).collect();
        println!(
            "cycle {:>3} [{}] -> {}",
            index + 1,
            controller.status_message(),
            rendered.join(", ")
        );
    }

    if metrics {
        let snapshot = controller.metrics().snapshot();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

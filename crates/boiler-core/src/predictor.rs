//! Hydraulic prediction of the post-cycle water level.
//!
//! For every candidate pump count `k` in `0..=P` the predictor brackets the
//! plausible water level one cycle ahead:
//!
//! - the upper bound assumes steam consumption equal to the current reading,
//! - the lower bound assumes steam consumption at the maximal rated value,
//! - the mid-point is the estimator the selector ranks on.
//!
//! Pump inflow for `k >= 1` is charged as `CYCLE · cap[k-1] · k`: all engaged
//! pumps at the capacity of the last engaged index. With uniform pumps this
//! equals the per-pump sum; with heterogeneous pumps it does not, and the
//! formula is kept as-is so observable pump selection stays identical to the
//! deployed supervisor.

use crate::config::BoilerCharacteristics;
use crate::CYCLE_SECONDS;

/// Predicted water-level interval after one cycle for a fixed pump count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelPrediction {
    /// Maximum plausible level (steam at the current reading).
    pub max: f64,

    /// Minimum plausible level (steam at the maximal rated value).
    pub min: f64,

    /// Mid-interval estimator.
    pub mid: f64,
}

impl LevelPrediction {
    fn bracket(max: f64, min: f64) -> Self {
        Self {
            max,
            min,
            mid: (max + min) / 2.0,
        }
    }
}

/// Predict the post-cycle water level for every pump count `0..=P`.
///
/// Element `k` of the result is the prediction with `k` pumps engaged.
pub fn predict(
    characteristics: &BoilerCharacteristics,
    water_level: f64,
    steam_level: f64,
) -> Vec<LevelPrediction> {
    let pump_count = characteristics.number_of_pumps();
    let steam_loss = CYCLE_SECONDS * steam_level;
    let max_steam_loss = CYCLE_SECONDS * characteristics.maximal_steam_rate;

    let mut predictions = Vec::with_capacity(pump_count + 1);
    predictions.push(LevelPrediction::bracket(
        water_level - steam_loss,
        water_level - max_steam_loss,
    ));

    for k in 1..=pump_count {
        let inflow = CYCLE_SECONDS * characteristics.pump_capacity(k - 1) * k as f64;
        predictions.push(LevelPrediction::bracket(
            water_level + inflow - steam_loss,
            water_level + inflow - max_steam_loss,
        ));
    }

    predictions
}

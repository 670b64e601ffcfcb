//! Boiler characteristics: the immutable physical configuration of a run.
//!
//! A [`BoilerCharacteristics`] value is supplied at controller construction
//! and never changes afterwards. Values can be built programmatically via
//! [`BoilerCharacteristics::builder`] or deserialized from a scenario file;
//! either way [`BoilerCharacteristics::validate`] enforces the data-model
//! constraints before a controller will accept them.

use crate::{BoilerError, Result};
use serde::{Deserialize, Serialize};

/// Physical characteristics of the supervised boiler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoilerCharacteristics {
    /// Total drum capacity, in volume units.
    pub capacity: f64,

    /// Lower bound of the safety envelope.
    pub minimal_limit_level: f64,

    /// Upper bound of the safety envelope.
    pub maximal_limit_level: f64,

    /// Lower bound of the normal operating band.
    pub minimal_normal_level: f64,

    /// Upper bound of the normal operating band.
    pub maximal_normal_level: f64,

    /// Maximal rated steam output, in volume per cycle-unit.
    pub maximal_steam_rate: f64,

    /// Per-pump throughput, in volume per time-unit. One entry per pump;
    /// pump `i` is `pump_capacities[i]`.
    pub pump_capacities: Vec<f64>,
}

impl BoilerCharacteristics {
    /// Create a new builder.
    pub fn builder() -> BoilerCharacteristicsBuilder {
        BoilerCharacteristicsBuilder::default()
    }

    /// Number of pumps attached to the boiler.
    pub fn number_of_pumps(&self) -> usize {
        self.pump_capacities.len()
    }

    /// Throughput of pump `index`.
    ///
    /// Panics if `index` is out of range; callers iterate `0..number_of_pumps()`.
    pub fn pump_capacity(&self, index: usize) -> f64 {
        self.pump_capacities[index]
    }

    /// Midpoint of the normal band, the level the selector steers toward.
    pub fn normal_mid_point(&self) -> f64 {
        (self.minimal_normal_level + self.maximal_normal_level) / 2.0
    }

    /// Validate the characteristics against the data-model constraints.
    ///
    /// The limits must nest strictly around the normal band, the capacity
    /// must dominate the upper limit, and every pump must have positive
    /// throughput. Controllers refuse to start on an invalid value.
    pub fn validate(&self) -> Result<()> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(BoilerError::Config("capacity must be positive".into()));
        }
        if self.minimal_limit_level < 0.0 {
            return Err(BoilerError::Config(
                "minimal_limit_level must be non-negative".into(),
            ));
        }
        if self.minimal_normal_level <= self.minimal_limit_level {
            return Err(BoilerError::Config(format!(
                "minimal_normal_level ({}) must exceed minimal_limit_level ({})",
                self.minimal_normal_level, self.minimal_limit_level
            )));
        }
        if self.maximal_normal_level <= self.minimal_normal_level {
            return Err(BoilerError::Config(format!(
                "maximal_normal_level ({}) must exceed minimal_normal_level ({})",
                self.maximal_normal_level, self.minimal_normal_level
            )));
        }
        if self.maximal_limit_level <= self.maximal_normal_level {
            return Err(BoilerError::Config(format!(
                "maximal_limit_level ({}) must exceed maximal_normal_level ({})",
                self.maximal_limit_level, self.maximal_normal_level
            )));
        }
        if self.capacity <= self.maximal_limit_level {
            return Err(BoilerError::Config(format!(
                "capacity ({}) must exceed maximal_limit_level ({})",
                self.capacity, self.maximal_limit_level
            )));
        }
        if !self.maximal_steam_rate.is_finite() || self.maximal_steam_rate <= 0.0 {
            return Err(BoilerError::Config(
                "maximal_steam_rate must be positive".into(),
            ));
        }
        if self.pump_capacities.is_empty() {
            return Err(BoilerError::Config("at least one pump is required".into()));
        }
        for (i, cap) in self.pump_capacities.iter().enumerate() {
            if !cap.is_finite() || *cap <= 0.0 {
                return Err(BoilerError::Config(format!(
                    "pump {i} capacity must be positive (got {cap})"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`BoilerCharacteristics`].
#[derive(Debug, Default)]
pub struct BoilerCharacteristicsBuilder {
    capacity: f64,
    minimal_limit_level: f64,
    maximal_limit_level: f64,
    minimal_normal_level: f64,
    maximal_normal_level: f64,
    maximal_steam_rate: f64,
    pump_capacities: Vec<f64>,
}

impl BoilerCharacteristicsBuilder {
    /// Set the drum capacity.
    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the safety envelope `[min, max]`.
    pub fn limit_levels(mut self, min: f64, max: f64) -> Self {
        self.minimal_limit_level = min;
        self.maximal_limit_level = max;
        self
    }

    /// Set the normal operating band `[min, max]`.
    pub fn normal_levels(mut self, min: f64, max: f64) -> Self {
        self.minimal_normal_level = min;
        self.maximal_normal_level = max;
        self
    }

    /// Set the maximal rated steam output.
    pub fn maximal_steam_rate(mut self, rate: f64) -> Self {
        self.maximal_steam_rate = rate;
        self
    }

    /// Install `count` pumps of identical `capacity`.
    pub fn uniform_pumps(mut self, count: usize, capacity: f64) -> Self {
        self.pump_capacities = vec![capacity; count];
        self
    }

    /// Install pumps with the given per-pump capacities.
    pub fn pump_capacities(mut self, capacities: impl Into<Vec<f64>>) -> Self {
        self.pump_capacities = capacities.into();
        self
    }

    /// Build and validate the characteristics.
    pub fn build(self) -> Result<BoilerCharacteristics> {
        let characteristics = BoilerCharacteristics {
            capacity: self.capacity,
            minimal_limit_level: self.minimal_limit_level,
            maximal_limit_level: self.maximal_limit_level,
            minimal_normal_level: self.minimal_normal_level,
            maximal_normal_level: self.maximal_normal_level,
            maximal_steam_rate: self.maximal_steam_rate,
            pump_capacities: self.pump_capacities,
        };
        characteristics.validate()?;
        Ok(characteristics)
    }
}

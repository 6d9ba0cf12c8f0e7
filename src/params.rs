/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * adjustable tunables for the flock integrator. All fields may be mutated
 * between ticks; validation only runs when a Flock is constructed or when
 * a caller asks for it explicitly.
 */

use thiserror::Error;

/// Errors produced when a configuration fails its numeric range checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

// Tunables for the simulation that can be adjusted between ticks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParams {
    pub num_boids: usize,
    /// Neighbor cap per agent, applied in traversal order.
    pub accuracy: usize,
    pub drag: f32,
    pub randomness: f32,
    pub interaction_radius: f32,
    pub alignment_force: f32,
    /// Extra weight for neighbors flying in a similar direction.
    pub alignment_bias: f32,
    pub cohesion_force: f32,
    pub separation_force: f32,
    /// Overall scale applied to the summed steering forces.
    pub steering_force: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 500,
            accuracy: 16,
            drag: 0.02,
            randomness: 0.05,
            interaction_radius: 10.0,
            alignment_force: 1.0,
            alignment_bias: 0.5,
            cohesion_force: 1.0,
            separation_force: 1.5,
            steering_force: 4.0,
            min_speed: 2.0,
            max_speed: 8.0,
        }
    }
}

impl SimulationParams {
    // Check the simple numeric ranges every field must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_boids == 0 {
            return Err(ConfigError::Invalid("num_boids must be at least 1"));
        }
        if self.accuracy == 0 {
            return Err(ConfigError::Invalid("accuracy must be at least 1"));
        }
        if !(self.interaction_radius > 0.0) {
            return Err(ConfigError::Invalid("interaction_radius must be positive"));
        }
        if !(0.0..=1.0).contains(&self.drag) {
            return Err(ConfigError::Invalid("drag must lie in [0, 1]"));
        }
        if !(self.randomness >= 0.0) {
            return Err(ConfigError::Invalid("randomness must be non-negative"));
        }
        if !(self.min_speed >= 0.0) {
            return Err(ConfigError::Invalid("min_speed must be non-negative"));
        }
        if !(self.max_speed >= self.min_speed) {
            return Err(ConfigError::Invalid("max_speed must be at least min_speed"));
        }
        for (value, name) in [
            (self.alignment_force, "alignment_force must be non-negative and finite"),
            (self.cohesion_force, "cohesion_force must be non-negative and finite"),
            (self.separation_force, "separation_force must be non-negative and finite"),
            (self.steering_force, "steering_force must be non-negative and finite"),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid(name));
            }
        }
        Ok(())
    }

    // Swap in a whole new configuration, returning the prior one for
    // audit/undo at the call site.
    pub fn replace(&mut self, new: SimulationParams) -> SimulationParams {
        std::mem::replace(self, new)
    }

    // Parameter ranges for UI sliders
    pub fn get_num_boids_range() -> std::ops::RangeInclusive<usize> {
        10..=100000
    }

    pub fn get_accuracy_range() -> std::ops::RangeInclusive<usize> {
        1..=64
    }

    pub fn get_drag_range() -> std::ops::RangeInclusive<f32> {
        0.0..=0.5
    }

    pub fn get_randomness_range() -> std::ops::RangeInclusive<f32> {
        0.0..=1.0
    }

    pub fn get_radius_range() -> std::ops::RangeInclusive<f32> {
        1.0..=50.0
    }

    pub fn get_force_range() -> std::ops::RangeInclusive<f32> {
        0.0..=3.0
    }

    pub fn get_speed_range() -> std::ops::RangeInclusive<f32> {
        1.0..=100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert_eq!(SimulationParams::default().validate(), Ok(()));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut params = SimulationParams::default();
        params.num_boids = 0;
        assert!(params.validate().is_err());

        let mut params = SimulationParams::default();
        params.interaction_radius = 0.0;
        assert!(params.validate().is_err());

        let mut params = SimulationParams::default();
        params.interaction_radius = f32::NAN;
        assert!(params.validate().is_err());

        let mut params = SimulationParams::default();
        params.drag = 1.5;
        assert!(params.validate().is_err());

        let mut params = SimulationParams::default();
        params.max_speed = params.min_speed - 1.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn replace_returns_the_prior_configuration() {
        let mut params = SimulationParams::default();
        let mut updated = params;
        updated.accuracy = 32;

        let prior = params.replace(updated);
        assert_eq!(prior.accuracy, SimulationParams::default().accuracy);
        assert_eq!(params.accuracy, 32);
    }
}

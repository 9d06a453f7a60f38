//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::{PidParams, TrajCtrlError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {

    /// Gains of the speed controller, acting on the error between the
    /// profile's target speed and the speed along the path.
    pub speed_pid: PidParams,

    /// Gains of the lateral controller, acting on the signed distance of the
    /// projected position from the path.
    pub lat_pid: PidParams,

    /// How far into the future the robot's position is projected.
    ///
    /// Units: seconds
    pub look_ahead_time_s: f64,

    /// How far along the path beyond the closest point the look ahead point
    /// is placed.
    ///
    /// Units: inches
    pub look_ahead_distance_in: f64,

    /// Multiplier applied to negative speed corrections, to counter the
    /// robot's momentum when slowing down.
    pub decel_amplifier: f64,

    /// Maximum magnitude of either wheel power. Powers are scaled together
    /// to keep within this limit, preserving their ratio.
    pub max_power: f64,

    /// Floor on each wheel power while following a path.
    pub min_power: f64,

    /// Power of both wheels at the start of a path.
    pub initial_power: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            speed_pid: PidParams {
                k_p: 0.004,
                k_i: 0.0,
                k_d: 6e-6,
                integral_limit: Some(5.0)
            },
            lat_pid: PidParams {
                k_p: 0.002,
                k_i: 0.0,
                k_d: 0.006,
                integral_limit: Some(5.0)
            },
            look_ahead_time_s: 0.1,
            look_ahead_distance_in: 0.0,
            decel_amplifier: 1.5,
            max_power: 1.0,
            min_power: 0.05,
            initial_power: 0.2
        }
    }
}

impl Params {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), TrajCtrlError> {
        if !(self.max_power > 0f64) {
            return Err(TrajCtrlError::InvalidParams(
                format!("max_power must be positive, found {}", self.max_power)
            ))
        }

        if !(self.min_power <= self.max_power) {
            return Err(TrajCtrlError::InvalidParams(format!(
                "min_power ({}) must not exceed max_power ({})",
                self.min_power, self.max_power
            )))
        }

        if !(self.decel_amplifier >= 1f64) {
            return Err(TrajCtrlError::InvalidParams(format!(
                "decel_amplifier must be at least 1, found {}",
                self.decel_amplifier
            )))
        }

        if !(self.look_ahead_time_s >= 0f64 && self.look_ahead_distance_in >= 0f64) {
            return Err(TrajCtrlError::InvalidParams(format!(
                "Look ahead must not be negative, found {} s and {} in",
                self.look_ahead_time_s, self.look_ahead_distance_in
            )))
        }

        Ok(())
    }
}

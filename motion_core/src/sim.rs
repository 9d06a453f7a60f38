//! # Drive simulation
//!
//! A kinematic model of a differential drive robot fitted with the three
//! tracking wheels used by odometry. It allows the control loop to be run
//! without the robot, either from the `path_sim` executable or in tests.
//!
//! Each wheel's speed follows its demanded speed (power multiplied by the
//! maximum wheel speed) with a first order lag, which stands in for the
//! inertia of the robot. Wheels don't slip, so the tracking wheel readings
//! are exactly the distances the wheels roll.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Duration;
use log::trace;
use serde::Deserialize;

// Internal
use crate::geom::{forward_unit, Pose};
use crate::odom::EncoderReadings;
use crate::traj_ctrl::Powers;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated robot
#[derive(Debug, Copy, Clone, Deserialize)]
pub struct Params {
    /// Distance between the left and right drive wheels, which is also the
    /// distance between the parallel tracking wheels.
    ///
    /// Units: inches
    pub track_width_in: f64,

    /// Lever arm of the X tracking wheel about the centre of rotation.
    ///
    /// Units: inches
    pub x_wheel_offset_in: f64,

    /// Wheel speed at full power.
    ///
    /// Units: inches/second
    pub max_wheel_speed_ips: f64,

    /// Time constant of the wheels' response to a change in power. Zero for
    /// an instant response.
    ///
    /// Units: seconds
    pub response_time_s: f64
}

/// The simulated robot.
#[derive(Debug, Clone)]
pub struct DiffDriveSim {
    params: Params,

    /// True pose of the robot
    pose: Pose,

    /// Current speed of the left and right wheels
    ///
    /// Units: inches/second
    wheel_speeds_ips: (f64, f64),

    readings: EncoderReadings
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiffDriveSim {
    /// Create a new simulation with the robot at rest at the given pose. All
    /// tracking wheel readings start at zero.
    pub fn new(params: Params, pose: Pose) -> Result<Self, SimError> {
        if !(params.track_width_in > 0f64) {
            return Err(SimError::InvalidParams(format!(
                "track_width_in must be positive, found {}",
                params.track_width_in
            )))
        }
        if !(params.max_wheel_speed_ips > 0f64) {
            return Err(SimError::InvalidParams(format!(
                "max_wheel_speed_ips must be positive, found {}",
                params.max_wheel_speed_ips
            )))
        }
        if !(params.response_time_s >= 0f64) {
            return Err(SimError::InvalidParams(format!(
                "response_time_s must not be negative, found {}",
                params.response_time_s
            )))
        }

        Ok(Self {
            params,
            pose,
            wheel_speeds_ips: (0f64, 0f64),
            readings: EncoderReadings::default()
        })
    }

    /// The true pose of the robot.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// The current tracking wheel readings.
    pub fn readings(&self) -> EncoderReadings {
        self.readings
    }

    /// Drive the robot with the given powers for `dt`, returning the
    /// tracking wheel readings at the end of the step.
    ///
    /// Powers are limited to [-1, 1].
    pub fn step(&mut self, powers: &Powers, dt: Duration) -> EncoderReadings {
        let dt_s = dt.as_secs_f64();

        // Wheel speeds lag behind their demands
        let max_speed = self.params.max_wheel_speed_ips;
        let demand = |p: f64| p.max(-1f64).min(1f64) * max_speed;
        let alpha = if self.params.response_time_s > 0f64 {
            1f64 - (-dt_s / self.params.response_time_s).exp()
        }
        else {
            1f64
        };

        let (left, right) = self.wheel_speeds_ips;
        let left = left + (demand(powers.left_power) - left) * alpha;
        let right = right + (demand(powers.right_power) - right) * alpha;
        self.wheel_speeds_ips = (left, right);

        let d_left = left * dt_s;
        let d_right = right * dt_s;

        let d_head = (d_right - d_left) / self.params.track_width_in;
        let d_fwd = (d_right + d_left) / 2f64;

        // Chord of the arc travelled, which lies along the mean heading
        let chord = if d_head == 0f64 {
            d_fwd
        }
        else {
            2f64 * (d_fwd / d_head) * (d_head / 2f64).sin()
        };

        let disp = forward_unit(self.pose.heading + d_head / 2f64) * chord;
        self.pose.x += disp[0];
        self.pose.y += disp[1];
        self.pose.heading += d_head;

        self.readings.y1_in += d_right;
        self.readings.y2_in += d_left;
        self.readings.x_in += d_head * self.params.x_wheel_offset_in;

        trace!(
            "Sim: wheels ({:.3}, {:.3}) in/s, pose ({:.3}, {:.3}, {:.4} rad)",
            left, right, self.pose.x, self.pose.y, self.pose.heading
        );

        self.readings
    }
}

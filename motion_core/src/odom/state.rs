//! Odometry system state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::{OdomError, Params};
use crate::geom::{forward_unit, perp_left, Pose, Velocity};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cumulative distance rolled by each tracking wheel.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderReadings {
    /// Right-hand parallel wheel
    ///
    /// Units: inches
    pub y1_in: f64,

    /// Left-hand parallel wheel
    ///
    /// Units: inches
    pub y2_in: f64,

    /// Perpendicular wheel, positive to the robot's right
    ///
    /// Units: inches
    pub x_in: f64
}

/// The estimated state of the robot.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RobotState {
    pub position: Pose,

    /// Velocity in the global frame
    ///
    /// Units: inches/second
    pub velocity: Velocity,

    /// Rate of change of speed
    ///
    /// Units: inches/second^2
    pub acceleration: f64,

    /// Signed radius of the arc currently being travelled. Positive radii
    /// curve to the left. Infinite when travelling straight and zero when
    /// turning on the spot.
    ///
    /// Units: inches
    pub travel_radius: f64
}

/// Dead reckoning estimator.
#[derive(Debug, Clone)]
pub struct OdometrySystem {
    params: Params,

    /// Readings from the previous update
    prev_readings: EncoderReadings,

    /// Instant of the previous update
    prev_time: Instant,

    state: RobotState
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotState {
    /// A robot at rest at the given pose.
    pub fn at_rest(position: Pose) -> Self {
        Self {
            position,
            velocity: Velocity::default(),
            acceleration: 0f64,
            travel_radius: std::f64::INFINITY
        }
    }
}

impl OdometrySystem {
    /// Create a new estimator at the origin facing +Y.
    ///
    /// `initial` are the readings of the wheels at `now`, all future motion is
    /// measured relative to them.
    pub fn new(
        params: Params,
        initial: EncoderReadings,
        now: Instant
    ) -> Result<Self, OdomError> {
        Self::from_pose(params, initial, Pose::default(), now)
    }

    /// Create a new estimator starting at the given pose.
    pub fn from_pose(
        params: Params,
        initial: EncoderReadings,
        pose: Pose,
        now: Instant
    ) -> Result<Self, OdomError> {
        if !(params.track_width_in.is_finite() && params.track_width_in > 0f64) {
            return Err(OdomError::InvalidTrackWidth(params.track_width_in))
        }
        if !params.x_wheel_offset_in.is_finite() {
            return Err(OdomError::InvalidXWheelOffset(params.x_wheel_offset_in))
        }

        Ok(Self {
            params,
            prev_readings: initial,
            prev_time: now,
            state: RobotState::at_rest(pose)
        })
    }

    /// Get the latest state estimate.
    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Overwrite the estimated pose, keeping the current velocity estimate.
    pub fn set_pose(&mut self, pose: Pose) {
        self.state.position = pose;
    }

    /// Update the estimate with new wheel readings taken at `now`.
    pub fn update(&mut self, readings: EncoderReadings, now: Instant) -> RobotState {
        // Wheel travel since the last update
        let d_y1 = readings.y1_in - self.prev_readings.y1_in;
        let d_y2 = readings.y2_in - self.prev_readings.y2_in;
        let d_x = readings.x_in - self.prev_readings.x_in;

        // The right wheel rolls further than the left when turning
        // counter-clockwise
        let d_head = (d_y1 - d_y2) / self.params.track_width_in;

        // Remove the part of the X wheel's travel caused by the rotation
        let d_fwd = (d_y1 + d_y2) / 2f64;
        let d_lat = d_x - d_head * self.params.x_wheel_offset_in;

        // Rotate the displacement into the global frame using the heading at
        // the middle of the update
        let mid_fwd = forward_unit(self.state.position.heading + d_head / 2f64);
        let mid_right = -perp_left(&mid_fwd);
        let disp = mid_fwd * d_fwd + mid_right * d_lat;

        let mut state = self.state;
        state.position.x += disp[0];
        state.position.y += disp[1];
        state.position.heading += d_head;

        // Signed radius of the arc, guarding straight travel
        state.travel_radius = if d_head == 0f64 {
            if d_fwd < 0f64 {
                std::f64::NEG_INFINITY
            }
            else {
                std::f64::INFINITY
            }
        }
        else {
            d_fwd / d_head
        };

        // Rates need time to have passed, if it hasn't keep the previous ones
        let dt_s = now.saturating_duration_since(self.prev_time).as_secs_f64();
        if dt_s > 0f64 {
            let velocity = Velocity::new(disp[0] / dt_s, disp[1] / dt_s);
            state.acceleration = (velocity.speed() - self.state.velocity.speed()) / dt_s;
            state.velocity = velocity;
        }
        else {
            warn!("Odometry updated with no elapsed time, keeping previous velocity");
        }

        trace!(
            "Odometry: pose ({:.3}, {:.3}, {:.4} rad), speed {:.3}, radius {:.3}",
            state.position.x,
            state.position.y,
            state.position.heading,
            state.velocity.speed(),
            state.travel_radius
        );

        self.state = state;
        self.prev_readings = readings;
        self.prev_time = now;

        state
    }
}

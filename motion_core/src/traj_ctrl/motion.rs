//! Projection of the robot's motion into the future

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::geom::{Point, Pose};
use crate::odom::RobotState;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The motion the robot is currently making, used to estimate where it will
/// be a short time from now.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum Motion {
    /// Straight along the current heading.
    Forward {
        /// Units: inches
        distance: f64
    },

    /// Round a circular arc. Positive radii curve to the left.
    Arc {
        /// Units: inches
        radius: f64,

        /// Distance along the arc
        ///
        /// Units: inches
        distance: f64
    },

    /// Turning on the spot.
    Turn
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Motion {
    /// Determine the motion the robot will make over the next `look_ahead_s`
    /// seconds, assuming constant acceleration and travel radius.
    pub fn from_state(state: &RobotState, look_ahead_s: f64) -> Self {
        // Signed so that reversing projects backwards
        let speed = state.velocity.along(&state.position.forward());

        // Acceleration is the rate of change of the speed's magnitude, so it
        // acts in the direction of travel
        let acceleration = if speed < 0f64 {
            -state.acceleration
        }
        else {
            state.acceleration
        };

        let distance = speed * look_ahead_s
            + 0.5 * acceleration * look_ahead_s * look_ahead_s;

        let radius = state.travel_radius;

        if radius.is_infinite() || radius.is_nan() {
            Motion::Forward { distance }
        }
        else if radius == 0f64 {
            Motion::Turn
        }
        else {
            Motion::Arc { radius, distance }
        }
    }

    /// Apply this motion to the pose, giving the position the robot ends up
    /// at.
    pub fn project(&self, pose: &Pose) -> Point {
        match *self {
            Motion::Forward { distance } => pose.position().offset(&(pose.forward() * distance)),
            Motion::Arc { radius, distance } => {
                // Centre of the arc is off the robot's left side for positive
                // radii and its right side for negative ones
                let centre = pose.position().offset(&(pose.left() * radius));

                // Rotating the radius vector about the centre by the angle
                // subtended. Negative radii give clockwise rotation.
                let angle = distance / radius;
                let (sin, cos) = angle.sin_cos();
                let r = pose.position().delta_from(&centre);

                centre.offset(&nalgebra::Vector2::new(
                    r[0] * cos - r[1] * sin,
                    r[0] * sin + r[1] * cos
                ))
            },
            Motion::Turn => pose.position()
        }
    }
}

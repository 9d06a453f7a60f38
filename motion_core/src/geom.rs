//! # Geometry primitives
//!
//! Frame convention used throughout the crate: a heading of zero faces the
//! global +Y axis and heading increases counter-clockwise. The robot's right
//! hand side at zero heading is therefore the global +X axis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on the field plane.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64
}

/// Position and heading of the robot.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,

    /// Heading in radians, counter-clockwise from the +Y axis. Not wrapped, 
    /// so multiple turns accumulate.
    pub heading: f64
}

/// Velocity of the robot in the global frame.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f64,
    pub dy: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidian distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.vector() - self.vector()).norm()
    }

    /// The position vector of this point.
    pub fn vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Offset this point by a vector.
    pub fn offset(&self, delta: &Vector2<f64>) -> Point {
        Point::new(self.x + delta[0], self.y + delta[1])
    }

    /// Vector from `other` to this point.
    pub fn delta_from(&self, other: &Point) -> Vector2<f64> {
        self.vector() - other.vector()
    }
}

impl From<Vector2<f64>> for Point {
    fn from(v: Vector2<f64>) -> Self {
        Point::new(v[0], v[1])
    }
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Position part of the pose.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Heading wrapped into (-pi, pi].
    pub fn wrapped_heading(&self) -> f64 {
        wrap_pi(self.heading)
    }

    /// Unit vector pointing in the direction the robot faces.
    pub fn forward(&self) -> Vector2<f64> {
        forward_unit(self.heading)
    }

    /// Unit vector pointing out of the robot's left side.
    pub fn left(&self) -> Vector2<f64> {
        perp_left(&self.forward())
    }
}

impl Velocity {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Build a velocity from a speed and a direction (angle to the +X axis).
    pub fn from_speed_direction(speed: f64, direction: f64) -> Self {
        Self {
            dx: speed * direction.cos(),
            dy: speed * direction.sin()
        }
    }

    pub fn vector(&self) -> Vector2<f64> {
        Vector2::new(self.dx, self.dy)
    }

    /// Magnitude of the velocity.
    pub fn speed(&self) -> f64 {
        self.vector().norm()
    }

    /// Angle of the velocity to the +X axis, in radians.
    pub fn direction(&self) -> f64 {
        self.dy.atan2(self.dx)
    }

    /// Signed component of the velocity along the given unit vector.
    pub fn along(&self, unit: &Vector2<f64>) -> f64 {
        self.vector().dot(unit)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Unit vector for a heading.
pub fn forward_unit(heading: f64) -> Vector2<f64> {
    Vector2::new(-heading.sin(), heading.cos())
}

/// The vector rotated a quarter turn counter-clockwise.
pub fn perp_left(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v[1], v[0])
}

/// Z component of the cross product of two planar vectors.
///
/// Positive when `b` lies to the left of `a`.
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

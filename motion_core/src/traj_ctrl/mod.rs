//! # Trajectory control module
//!
//! Trajectory control is responsible for keeping the robot on the target
//! path while driving it along at the speed set by the path's profile. It
//! does this with a pair of PID controllers, one on the speed error and one
//! on the lateral error, whose outputs adjust the left and right wheel powers.
//!
//! Rather than acting on where the robot is now, both errors are measured at
//! where the robot will be a short time from now. The robot's current motion
//! (straight, an arc, or a turn on the spot) is extrapolated over the look
//! ahead time and the projected position located on the path. This gives the
//! controller some anticipation of upcoming corners and of the robot's own
//! momentum.
//!
//! The speed error is the target speed at the projected position minus the
//! robot's speed along the current path segment. Negative corrections are
//! amplified since the robot coasts when the power is reduced. The lateral
//! error is the signed distance of the projected position from the path,
//! positive to the right.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod motion;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use motion::Motion;
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur when setting up trajectory control.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Invalid trajectory control parameters: {0}")]
    InvalidParams(String)
}

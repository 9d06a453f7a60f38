//! # Odometry module
//!
//! Dead reckoning from three unpowered tracking wheels. Two wheels (Y1 on the
//! right, Y2 on the left) are parallel to the robot's direction of travel and
//! separated by the track width. The third (X) wheel is perpendicular to them
//! and sits some distance from the centre of rotation, so it rolls both when
//! the robot strafes and when it turns.
//!
//! Each update the wheel travel since the previous update is converted into a
//! change in heading and a forward/lateral displacement. The displacement is
//! rotated into the global frame using the heading at the middle of the
//! update (the average of the start and end headings), which keeps the drift
//! small when turning quickly.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when setting up odometry.
#[derive(Debug, thiserror::Error)]
pub enum OdomError {
    #[error("The track width must be positive and finite, found {0}")]
    InvalidTrackWidth(f64),

    #[error("The X wheel offset must be finite, found {0}")]
    InvalidXWheelOffset(f64)
}

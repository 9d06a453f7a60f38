//! Odometry parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry of the tracking wheels.
#[derive(Debug, Copy, Clone, Deserialize)]
pub struct Params {
    /// Distance between the two parallel (Y) wheels.
    ///
    /// Units: inches
    pub track_width_in: f64,

    /// Distance from the centre of rotation to the X wheel's contact line,
    /// equal to the distance the X wheel rolls per radian of rotation. 
    /// Positive when a counter-clockwise rotation rolls the X wheel in its
    /// positive direction.
    ///
    /// Units: inches
    pub x_wheel_offset_in: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Build parameters with the X wheel offset given as inches rolled per
    /// degree of rotation, which is how it is usually measured on the robot.
    pub fn from_x_inches_per_degree(track_width_in: f64, x_in_per_deg: f64) -> Self {
        Self {
            track_width_in,
            x_wheel_offset_in: x_in_per_deg.to_degrees()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_load_params() {
        let params: Params = util::params::parse(
            "track_width_in = 12.0\nx_wheel_offset_in = 5.5\n"
        ).unwrap();

        assert_eq!(params.track_width_in, 12.0);
        assert_eq!(params.x_wheel_offset_in, 5.5);
    }

    #[test]
    fn test_from_x_inches_per_degree() {
        // A tenth of an inch per degree is 5.73 inches per radian
        let params = Params::from_x_inches_per_degree(12.0, 0.1);
        assert_abs_diff_eq!(params.x_wheel_offset_in, 5.729578, epsilon = 1e-6);
    }
}

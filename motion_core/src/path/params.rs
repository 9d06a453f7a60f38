//! Path definition files

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path as written in a path definition file under `params/paths`.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// The `[x, y]` points of the path, in order.
    ///
    /// Units: inches
    pub points: Vec<[f64; 2]>,

    /// If true the path is mirrored across the Y axis, so that a path
    /// written for one side of the field can be run on the other.
    #[serde(default)]
    pub mirrored: bool,

    /// Target power before the first profile point
    pub initial_power: f64,

    /// Target power at the end of the path
    pub final_power: f64,

    /// `[distance_from_start, power]` rows of the speed profile.
    #[serde(default)]
    pub profile: Vec<Vec<f64>>
}

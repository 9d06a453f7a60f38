//! Speed profile along a path

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::PathError;
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Piecewise linear target power (interpreted as speed) against distance
/// along the path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerProfile {
    /// Power used before the first control point
    initial_power: f64,

    /// Control points as `(distance_from_start, power)`, ordered by distance.
    /// The last point is always `(total_length, final_power)`.
    points: Vec<(f64, f64)>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PowerProfile {
    /// Build a new profile for a path of the given length.
    ///
    /// Each row must contain exactly a distance and a power, both finite.
    /// Distances must be non-negative, non-decreasing and no greater than the
    /// length of the path.
    pub fn new(
        rows: &[Vec<f64>],
        initial_power: f64,
        final_power: f64,
        total_length: f64
    ) -> Result<Self, PathError> {
        let mut points = Vec::with_capacity(rows.len() + 1);
        let mut prev_distance = 0f64;

        for (index, row) in rows.iter().enumerate() {
            if row.len() != 2 || !row.iter().all(|v| v.is_finite()) {
                return Err(PathError::MalformedProfileRow { index, len: row.len() })
            }

            let (distance, power) = (row[0], row[1]);

            if distance < prev_distance {
                return Err(PathError::NonMonotonicProfile { index })
            }
            if distance > total_length {
                return Err(PathError::ProfileBeyondEnd { distance, length: total_length })
            }

            points.push((distance, power));
            prev_distance = distance;
        }

        points.push((total_length, final_power));

        Ok(Self {
            initial_power,
            points
        })
    }

    /// Get the target power at the given distance from the start of the path.
    ///
    /// Where two control points share a distance the later one wins.
    pub fn power_at(&self, distance: f64) -> f64 {
        // Index of the last control point at or before the distance
        let lower = match self.points.iter().rposition(|p| p.0 <= distance) {
            Some(i) => i,
            None => return self.initial_power
        };

        match self.points.get(lower + 1) {
            Some(upper) => {
                let lower = self.points[lower];
                lin_map((lower.0, upper.0), (lower.1, upper.1), distance)
            },
            None => self.final_power()
        }
    }

    pub fn initial_power(&self) -> f64 {
        self.initial_power
    }

    pub fn final_power(&self) -> f64 {
        // There's always the implicit end point
        self.points.last().map(|p| p.1).unwrap_or(self.initial_power)
    }

    /// The control points, including the implicit end point.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

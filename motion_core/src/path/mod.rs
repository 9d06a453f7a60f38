//! # Path module
//!
//! A path is a polyline of points for the robot to follow, along with a
//! profile of the target power (interpreted as a speed) against distance
//! travelled along the path.
//!
//! Paths are immutable once built. Progress along a path is tracked by a
//! cursor, the index of the last point the robot has passed. The cursor is
//! owned by the caller: queries take the current cursor and return the
//! advanced one inside the `PathLocation`, which the caller carries into its
//! next query. The robot has passed a point once it crosses the line through
//! that point perpendicular to the segment arriving at it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod profile;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use crate::geom::{cross, Point};
use util::raise_error;
pub use params::Params;
pub use profile::PowerProfile;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Points closer than this to the previous point are treated as duplicates.
///
/// Units: inches
const DUPLICATE_POINT_EPSILON_IN: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path for the robot to follow.
#[derive(Debug, Clone)]
pub struct Path {
    points: Vec<Point>,

    /// Metadata for each point, aligned with `points`
    meta: Vec<PathPointMeta>,

    profile: PowerProfile,

    /// Units: inches
    total_length: f64
}

/// Information about a point's position along the path.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PathPointMeta {
    /// Distance along the path from the first point.
    ///
    /// Units: inches
    pub distance_from_start: f64,

    /// Vector from the previous point to this point. Zero for the first
    /// point.
    pub incoming: Vector2<f64>,

    /// Length of the segment arriving at this point. Zero for the first
    /// point.
    ///
    /// Units: inches
    pub segment_length: f64
}

/// Where the robot is relative to the path.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PathLocation {
    /// Closest point to the robot on the line through the current segment
    pub closest_point: Point,

    /// Units: inches
    pub distance_from_start: f64,

    /// Units: inches
    pub distance_to_end: f64,

    /// Signed perpendicular distance from the path to the robot, positive
    /// when the robot is to the right of the path.
    ///
    /// Units: inches
    pub distance_to_robot: f64,

    /// Target speed from the profile at `distance_from_start`
    pub target_speed: f64,

    /// The point the look ahead distance further along the path
    pub future_point: Point,

    /// Unit vector along the current segment
    pub path_direction: Vector2<f64>,

    /// The advanced cursor, to be passed into the next query
    pub bound_index: usize,

    /// True once the robot has passed the last point
    pub finished: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur while building a path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A path needs at least two distinct points")]
    TooFewPoints,

    #[error("Path point {0} is not finite")]
    NonFinitePoint(usize),

    #[error("Profile row {index} has {len} values, expected a finite distance and power")]
    MalformedProfileRow {
        index: usize,
        len: usize
    },

    #[error("Profile row {index} is negative or closer to the start than the previous row")]
    NonMonotonicProfile {
        index: usize
    },

    #[error("Profile point at {distance} is beyond the end of the path ({length})")]
    ProfileBeyondEnd {
        distance: f64,
        length: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Build a new path.
    ///
    /// Consecutive duplicate points are removed. `profile` rows are
    /// `[distance_from_start, power]` pairs, see `PowerProfile`.
    pub fn new(
        points: &[Point],
        initial_power: f64,
        final_power: f64,
        profile: &[Vec<f64>]
    ) -> Result<Self, PathError> {
        let mut kept: Vec<Point> = Vec::with_capacity(points.len());
        let mut meta: Vec<PathPointMeta> = Vec::with_capacity(points.len());
        let mut total_length = 0f64;

        for (i, point) in points.iter().enumerate() {
            if !(point.x.is_finite() && point.y.is_finite()) {
                return Err(PathError::NonFinitePoint(i))
            }

            match kept.last() {
                None => meta.push(PathPointMeta {
                    distance_from_start: 0f64,
                    incoming: Vector2::zeros(),
                    segment_length: 0f64
                }),
                Some(prev) => {
                    let incoming = point.delta_from(prev);
                    let segment_length = incoming.norm();

                    if segment_length <= DUPLICATE_POINT_EPSILON_IN {
                        debug!("Dropping duplicate path point {} at ({}, {})", i, point.x, point.y);
                        continue;
                    }

                    total_length += segment_length;
                    meta.push(PathPointMeta {
                        distance_from_start: total_length,
                        incoming,
                        segment_length
                    });
                }
            }

            kept.push(*point);
        }

        if kept.len() < 2 {
            return Err(PathError::TooFewPoints)
        }

        let profile = PowerProfile::new(profile, initial_power, final_power, total_length)?;

        debug!(
            "Built path of {} points, {:.3} in long",
            kept.len(), total_length
        );

        Ok(Self {
            points: kept,
            meta,
            profile,
            total_length
        })
    }

    /// Build a path from a path definition file's parameters.
    pub fn from_params(params: &Params) -> Result<Self, PathError> {
        let points: Vec<Point> = params.points
            .iter()
            .map(|p| match params.mirrored {
                true => Point::new(-p[0], p[1]),
                false => Point::new(p[0], p[1])
            })
            .collect();

        Self::new(&points, params.initial_power, params.final_power, &params.profile)
    }

    /// Number of points in the path.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, paths contain at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length of the path.
    ///
    /// Units: inches
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Get a point, or `None` if the index is out of range.
    pub fn point(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Get a point's metadata, or `None` if the index is out of range.
    pub fn meta(&self, index: usize) -> Option<&PathPointMeta> {
        self.meta.get(index)
    }

    pub fn profile(&self) -> &PowerProfile {
        &self.profile
    }

    /// Advance the cursor past every point the robot has passed.
    ///
    /// The returned cursor is never less than `cursor`.
    pub fn advance_bound(&self, cursor: usize, position: &Point) -> usize {
        self.check_cursor(cursor);

        let mut bound = cursor;

        for i in (cursor + 1)..self.points.len() {
            // Component of the vector from the robot to the point along the
            // segment arriving at the point. Non-positive once passed.
            let to_point = self.points[i].delta_from(position);

            if to_point.dot(&self.meta[i].incoming) <= 0f64 {
                bound = i;
            }
            else {
                break;
            }
        }

        if bound != cursor {
            debug!("Path cursor advanced from {} to {}", cursor, bound);
        }

        bound
    }

    /// True once the robot has passed the last point of the path.
    pub fn is_finished(&self, cursor: usize, position: &Point) -> bool {
        self.advance_bound(cursor, position) == self.points.len() - 1
    }

    /// Locate the robot relative to the path.
    ///
    /// `look_ahead` is how far along the path from the robot's closest point
    /// the `future_point` is placed.
    pub fn locate(&self, cursor: usize, position: &Point, look_ahead: f64) -> PathLocation {
        let bound = self.advance_bound(cursor, position);
        let last = self.points.len() - 1;

        // Once finished the location is pinned to the end of the path, with
        // the direction of the final segment.
        if bound == last {
            let end = self.points[last];
            let direction = self.meta[last].incoming / self.meta[last].segment_length;

            return PathLocation {
                closest_point: end,
                distance_from_start: self.total_length,
                distance_to_end: 0f64,
                distance_to_robot: lateral_offset(&direction, &position.delta_from(&end)),
                target_speed: self.profile.final_power(),
                future_point: end,
                path_direction: direction,
                bound_index: bound,
                finished: true
            }
        }

        let start = self.points[bound];
        let next_meta = &self.meta[bound + 1];
        let direction = next_meta.incoming / next_meta.segment_length;

        // Project onto the line through the segment. This isn't clamped to
        // the segment so the robot can be before the start or (briefly)
        // beyond the end of it.
        let along = position.delta_from(&start).dot(&direction);
        let closest_point = start.offset(&(direction * along));

        let distance_from_start = self.meta[bound].distance_from_start + along;

        PathLocation {
            closest_point,
            distance_from_start,
            distance_to_end: self.total_length - distance_from_start,
            distance_to_robot: lateral_offset(
                &direction,
                &position.delta_from(&closest_point)
            ),
            target_speed: self.profile.power_at(distance_from_start),
            future_point: self.point_at_distance(distance_from_start + look_ahead),
            path_direction: direction,
            bound_index: bound,
            finished: false
        }
    }

    /// Get the point the given distance along the path.
    ///
    /// Distances beyond the end of the path give the last point. Negative
    /// distances are extended backwards along the first segment.
    pub fn point_at_distance(&self, distance: f64) -> Point {
        if distance >= self.total_length {
            return self.points[self.points.len() - 1];
        }

        // First point at least the distance along. Must exist since the
        // distance is less than the total length, and can't be the first
        // point for non-negative distances.
        let i = match self.meta.iter().position(|m| m.distance_from_start >= distance) {
            Some(0) | None => 1,
            Some(i) => i
        };

        // Walk back from that point along the segment arriving at it
        let meta = &self.meta[i];
        let back = meta.distance_from_start - distance;
        let direction = meta.incoming / meta.segment_length;

        self.points[i].offset(&(-direction * back))
    }

    /// Querying beyond the end of the path is a broken invariant in the
    /// caller.
    fn check_cursor(&self, cursor: usize) {
        if cursor >= self.points.len() {
            raise_error!(
                "Path cursor {} is beyond the last point ({})",
                cursor, self.points.len() - 1
            );
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed perpendicular distance of `offset` from a line with unit
/// `direction`, positive to the right of the line.
fn lateral_offset(direction: &Vector2<f64>, offset: &Vector2<f64>) -> f64 {
    -cross(direction, offset)
}

//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::{Duration, Instant};
use log::{info, trace};
use serde::Serialize;

// Internal
use super::*;
use crate::geom::Point;
use crate::odom::RobotState;
use crate::path::Path;
use util::archive::TelemetrySink;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Follows a path by adjusting the power of the left and right wheels.
///
/// Speed along the path is controlled by adding the speed correction to both
/// wheels, and the lateral error by adding the lateral correction to the
/// right wheel and taking it from the left. Both corrections are incremental:
/// the powers are carried from cycle to cycle and the corrections added on.
pub struct HeadingController<'a> {
    params: Params,

    path: &'a Path,

    /// Index of the last path point the robot has passed
    cursor: usize,

    speed_ctrl: PidController,
    lat_ctrl: PidController,

    powers: Powers,

    prev_time: Option<Instant>,

    report: StatusReport
}

/// Wheel powers demanded by the controller.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct Powers {
    pub left_power: f64,
    pub right_power: f64,

    /// True once the end of the path has been reached. Powers are zero from
    /// then on.
    pub path_finished: bool
}

/// The status report containing monitoring quantities for the last cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Target speed from the path's profile at the look ahead point
    pub target_speed: f64,

    /// The robot's speed along the current path segment
    pub speed_along_path: f64,

    pub speed_error: f64,

    /// Signed distance of the projected position from the path, positive to
    /// the right.
    pub lat_error: f64,

    /// Speed correction after deceleration amplification
    pub speed_correction: f64,

    pub lat_correction: f64,

    /// Where the robot is projected to be after the look ahead time
    pub projected_point: Point,

    /// The path's look ahead point
    pub future_point: Point,

    pub distance_to_end: f64,

    /// True if the powers were scaled down to the maximum
    pub max_power_limited: bool,

    /// True if either power was raised to the minimum
    pub min_power_limited: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> HeadingController<'a> {
    /// Create a new controller to follow the given path.
    pub fn new(path: &'a Path, params: Params) -> Result<Self, TrajCtrlError> {
        params.validate()?;

        let speed_ctrl = PidController::from_params(&params.speed_pid);
        let lat_ctrl = PidController::from_params(&params.lat_pid);

        let powers = Powers {
            left_power: params.initial_power,
            right_power: params.initial_power,
            path_finished: false
        };

        Ok(Self {
            params,
            path,
            cursor: 0,
            speed_ctrl,
            lat_ctrl,
            powers,
            prev_time: None,
            report: StatusReport::default()
        })
    }

    /// Calculate the wheel powers for this cycle.
    ///
    /// The values of the cycle are appended to `telem`, which is not flushed.
    pub fn update(
        &mut self,
        state: &RobotState,
        now: Instant,
        telem: &mut dyn TelemetrySink
    ) -> Powers {
        self.report = StatusReport::default();

        if !self.powers.path_finished {
            self.follow_path(state, now);
        }

        self.write_telem(state, telem);

        self.powers
    }

    /// The report from the last cycle.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Index of the last path point passed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.powers.path_finished
    }

    /// The powers demanded in the last cycle.
    pub fn powers(&self) -> Powers {
        self.powers
    }

    fn follow_path(&mut self, state: &RobotState, now: Instant) {
        let position = state.position.position();

        // Commit progress along the path for the current position
        let current = self.path.locate(
            self.cursor,
            &position,
            self.params.look_ahead_distance_in
        );
        self.cursor = current.bound_index;

        if current.finished {
            info!("Path finished at ({:.3}, {:.3})", position.x, position.y);

            self.powers = Powers {
                left_power: 0f64,
                right_power: 0f64,
                path_finished: true
            };
            self.report.distance_to_end = 0f64;
            return
        }

        let dt = match self.prev_time {
            Some(t) => now.saturating_duration_since(t),
            None => Duration::from_secs(0)
        };
        self.prev_time = Some(now);

        // Where the robot will be shortly, and where that is relative to the
        // path. The cursor isn't advanced for the projected point since the
        // robot isn't there yet.
        let projected = Motion::from_state(state, self.params.look_ahead_time_s)
            .project(&state.position);
        let future = self.path.locate(
            self.cursor,
            &projected,
            self.params.look_ahead_distance_in
        );

        // Speed control
        let speed_along_path = state.velocity.along(&current.path_direction);
        let speed_error = future.target_speed - speed_along_path;
        let mut speed_correction = self.speed_ctrl
            .get_correction(speed_error, dt)
            .total_correction;
        if speed_correction < 0f64 {
            speed_correction *= self.params.decel_amplifier;
        }

        // Lateral control, a robot right of the path turns left by driving
        // the right wheel harder
        let lat_error = future.distance_to_robot;
        let lat_correction = self.lat_ctrl
            .get_correction(lat_error, dt)
            .total_correction;

        let mut left = self.powers.left_power + speed_correction - lat_correction;
        let mut right = self.powers.right_power + speed_correction + lat_correction;

        // Scale both powers down together to keep the ratio between them
        let higher = left.abs().max(right.abs());
        let max_power_limited = higher > self.params.max_power;
        if max_power_limited {
            left = left / higher * self.params.max_power;
            right = right / higher * self.params.max_power;
        }

        let min_power_limited = left < self.params.min_power
            || right < self.params.min_power;
        left = left.max(self.params.min_power);
        right = right.max(self.params.min_power);

        self.powers = Powers {
            left_power: left,
            right_power: right,
            path_finished: false
        };

        self.report = StatusReport {
            target_speed: future.target_speed,
            speed_along_path,
            speed_error,
            lat_error,
            speed_correction,
            lat_correction,
            projected_point: projected,
            future_point: future.future_point,
            distance_to_end: current.distance_to_end,
            max_power_limited,
            min_power_limited
        };

        trace!(
            "TrajCtrl: target {:.3}, speed {:.3}, lat {:.3} -> powers ({:.3}, {:.3})",
            future.target_speed,
            speed_along_path,
            lat_error,
            left,
            right
        );
    }

    fn write_telem(&self, state: &RobotState, telem: &mut dyn TelemetrySink) {
        let r = &self.report;

        telem.append("robot_x", state.position.x);
        telem.append("robot_y", state.position.y);
        telem.append("robot_heading", state.position.heading);
        telem.append("robot_speed", state.velocity.speed());
        telem.append("travel_radius", state.travel_radius);
        telem.append("target_speed", r.target_speed);
        telem.append("speed_along_path", r.speed_along_path);
        telem.append("speed_correction", r.speed_correction);
        telem.append("lat_error", r.lat_error);
        telem.append("lat_correction", r.lat_correction);
        telem.append("future_x", r.future_point.x);
        telem.append("future_y", r.future_point.y);
        telem.append("distance_to_end", r.distance_to_end);
        telem.append("left_power", self.powers.left_power);
        telem.append("right_power", self.powers.right_power);
        telem.append("path_finished", self.powers.path_finished as u8 as f64);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::{Pose, Velocity};
    use util::archive::NullTelemetry;

    const CYCLE: Duration = Duration::from_millis(20);

    fn straight_path() -> Path {
        Path::new(
            &[Point::new(0.0, 0.0), Point::new(0.0, 4.0)],
            12.0,
            0.0,
            &[]
        ).unwrap()
    }

    fn params() -> Params {
        Params {
            speed_pid: PidParams { k_p: 0.01, k_i: 0.0, k_d: 0.0, integral_limit: None },
            lat_pid: PidParams { k_p: 0.1, k_i: 0.0, k_d: 0.0, integral_limit: None },
            look_ahead_time_s: 0.1,
            look_ahead_distance_in: 0.0,
            decel_amplifier: 1.5,
            max_power: 1.0,
            min_power: 0.05,
            initial_power: 0.2
        }
    }

    fn at(x: f64, y: f64) -> RobotState {
        RobotState::at_rest(Pose::new(x, y, 0.0))
    }

    #[test]
    fn test_ramp_up() {
        let path = straight_path();
        let mut ctrl = HeadingController::new(&path, params()).unwrap();
        let t0 = Instant::now();

        let p1 = ctrl.update(&at(0.0, 0.0), t0, &mut NullTelemetry);
        assert!(p1.left_power > 0.2);
        assert!(p1.right_power > 0.2);

        let p2 = ctrl.update(&at(0.0, 0.0), t0 + CYCLE, &mut NullTelemetry);
        assert!(p2.left_power > p1.left_power);
        assert!(p2.right_power > p1.right_power);
        assert!(!p2.path_finished);

        // On the path there's no lateral correction
        assert_eq!(p2.left_power, p2.right_power);
    }

    #[test]
    fn test_robot_right_of_path() {
        let path = straight_path();
        let mut ctrl = HeadingController::new(&path, params()).unwrap();

        let p = ctrl.update(&at(1.0, 0.0), Instant::now(), &mut NullTelemetry);
        assert!(p.right_power > p.left_power);
        assert!(ctrl.report().lat_error > 0.0);
    }

    #[test]
    fn test_robot_left_of_path() {
        let path = straight_path();
        let mut ctrl = HeadingController::new(&path, params()).unwrap();

        let p = ctrl.update(&at(-1.0, 0.0), Instant::now(), &mut NullTelemetry);
        assert!(p.left_power > p.right_power);
        assert!(ctrl.report().lat_error < 0.0);
    }

    #[test]
    fn test_max_power_preserves_ratio() {
        let path = straight_path();
        let mut p = params();
        p.speed_pid.k_p = 1.0;
        let mut ctrl = HeadingController::new(&path, p).unwrap();

        // Large speed error and a lateral error
        let powers = ctrl.update(&at(1.0, 0.0), Instant::now(), &mut NullTelemetry);

        // Unclamped: speed correction 12, lateral correction 0.1
        let left = 0.2 + 12.0 - 0.1;
        let right = 0.2 + 12.0 + 0.1;

        assert!(ctrl.report().max_power_limited);
        assert!((powers.right_power - 1.0).abs() < 1e-12);
        assert!((powers.left_power / powers.right_power - left / right).abs() < 1e-12);
    }

    #[test]
    fn test_min_power_floor() {
        let path = straight_path();
        let mut p = params();
        p.lat_pid.k_p = 10.0;
        let mut ctrl = HeadingController::new(&path, p).unwrap();

        // Strongly right of the path drives the left power negative
        let powers = ctrl.update(&at(1.0, 0.0), Instant::now(), &mut NullTelemetry);

        assert!(ctrl.report().min_power_limited);
        assert_eq!(powers.left_power, 0.05);
        assert!(powers.right_power > powers.left_power);
    }

    #[test]
    fn test_deceleration_amplified() {
        let path = straight_path();
        let mut p = params();
        p.speed_pid.k_p = 0.001;
        let mut ctrl = HeadingController::new(&path, p).unwrap();

        // Travelling 22 in/s along the path against a target of 12
        let mut state = at(0.0, 0.0);
        state.velocity = Velocity::new(0.0, 22.0);

        ctrl.update(&state, Instant::now(), &mut NullTelemetry);
        let report = ctrl.report();

        assert_eq!(report.speed_error, -10.0);
        assert!((report.speed_correction - (-10.0 * 0.001 * 1.5)).abs() < 1e-12);
    }

    #[test]
    fn test_finished_is_terminal() {
        let path = straight_path();
        let mut ctrl = HeadingController::new(&path, params()).unwrap();
        let t0 = Instant::now();

        ctrl.update(&at(0.0, 1.0), t0, &mut NullTelemetry);
        assert!(!ctrl.is_finished());

        let p = ctrl.update(&at(0.0, 4.5), t0 + CYCLE, &mut NullTelemetry);
        assert!(p.path_finished);
        assert_eq!(p.left_power, 0.0);
        assert_eq!(p.right_power, 0.0);
        assert_eq!(ctrl.cursor(), 1);

        // Moving back onto the path doesn't restart it
        let p = ctrl.update(&at(0.0, 1.0), t0 + CYCLE * 2, &mut NullTelemetry);
        assert!(p.path_finished);
        assert_eq!(p, ctrl.powers());
        assert_eq!(p.left_power, 0.0);
    }

    #[test]
    fn test_invalid_params() {
        let path = straight_path();
        let mut p = params();
        p.min_power = 2.0;

        assert!(HeadingController::new(&path, p).is_err());
    }
}

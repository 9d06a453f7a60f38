//! Closed loop tests of odometry and trajectory control against the drive
//! simulation.

use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;

use motion_lib::{
    geom::{Point, Pose},
    odom::{self, OdometrySystem},
    path::{self, Path},
    sim::{self, DiffDriveSim},
    traj_ctrl::{self, HeadingController},
};
use util::archive::{NullTelemetry, TelemetrySink};

const CYCLE: Duration = Duration::from_millis(20);

/// Enough cycles to cover the paths below several times over.
const MAX_CYCLES: u32 = 3000;

fn sim_params() -> sim::Params {
    sim::Params {
        track_width_in: 12.0,
        x_wheel_offset_in: 5.0,
        max_wheel_speed_ips: 60.0,
        response_time_s: 0.1,
    }
}

fn odom_params() -> odom::Params {
    odom::Params {
        track_width_in: 12.0,
        x_wheel_offset_in: 5.0,
    }
}

/// Result of running the loop until the path finishes or the cycle limit is
/// reached.
struct Run {
    finished: bool,
    cycles: u32,
    truth: Pose,
    max_lat_error: f64,

    /// Lateral error sampled at each cycle
    lat_errors: Vec<f64>,

    /// Speed along the path sampled at each cycle
    speeds: Vec<f64>,
}

fn run(path: &Path, start: Pose) -> Run {
    let mut sim = DiffDriveSim::new(sim_params(), start).unwrap();
    let t0 = Instant::now();
    let mut odom = OdometrySystem::from_pose(odom_params(), sim.readings(), start, t0).unwrap();
    let mut ctrl = HeadingController::new(path, traj_ctrl::Params::default()).unwrap();
    let mut telem = NullTelemetry;

    let mut powers = ctrl.powers();
    let mut cycles = 0;
    let mut max_lat_error = 0f64;
    let mut lat_errors = Vec::new();
    let mut speeds = Vec::new();

    while !powers.path_finished && cycles < MAX_CYCLES {
        cycles += 1;
        let now = t0 + CYCLE * cycles;

        let readings = sim.step(&powers, CYCLE);
        let state = odom.update(readings, now);
        powers = ctrl.update(&state, now, &mut telem);
        telem.flush().unwrap();

        let report = ctrl.report();
        max_lat_error = max_lat_error.max(report.lat_error.abs());
        lat_errors.push(report.lat_error);
        speeds.push(report.speed_along_path);
    }

    Run {
        finished: powers.path_finished,
        cycles,
        truth: sim.pose(),
        max_lat_error,
        lat_errors,
        speeds,
    }
}

/// Largest lateral error over the last quarter of the run.
fn settled_lat_error(run: &Run) -> f64 {
    let n = run.lat_errors.len();
    run.lat_errors[3 * n / 4..]
        .iter()
        .fold(0f64, |max, e| max.max(e.abs()))
}

/// A 45 degree bend to the left, or to the right when mirrored.
fn bend_path(mirrored: bool) -> Path {
    let params: path::Params = util::params::parse(&format!(
        r#"
        points = [[0.0, 0.0], [0.0, 36.0], [-24.0, 60.0], [-24.0, 96.0]]
        mirrored = {}
        initial_power = 20.0
        final_power = 5.0
        "#,
        mirrored
    ))
    .unwrap();

    Path::from_params(&params).unwrap()
}

#[test]
fn test_straight_path_finishes() {
    let path = Path::new(
        &[Point::new(0.0, 0.0), Point::new(0.0, 48.0)],
        20.0,
        5.0,
        &[],
    )
    .unwrap();

    let result = run(&path, Pose::default());

    assert!(result.finished, "Path not finished after {} cycles", result.cycles);

    // Both sides are driven equally so the robot stays on the line
    assert_eq!(result.max_lat_error, 0.0);
    assert_abs_diff_eq!(result.truth.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.truth.heading, 0.0, epsilon = 1e-9);

    // Stopped just past the end of the path
    assert!(result.truth.y > 47.999);
    assert!(result.truth.y < 50.0);
}

#[test]
fn test_straight_path_reaches_target_speed() {
    let path = Path::new(
        &[Point::new(0.0, 0.0), Point::new(0.0, 96.0)],
        20.0,
        5.0,
        &[],
    )
    .unwrap();

    let result = run(&path, Pose::default());
    assert!(result.finished);

    // After the first two seconds the speed has settled on the target. The
    // last few cycles are slowing for the end of the path.
    let settled = &result.speeds[100..result.speeds.len() - 15];
    assert!(!settled.is_empty());
    for speed in settled {
        assert_abs_diff_eq!(*speed, 20.0, epsilon = 2.0);
    }
}

#[test]
fn test_finished_path_stays_stopped() {
    let path = Path::new(
        &[Point::new(0.0, 0.0), Point::new(0.0, 12.0)],
        20.0,
        5.0,
        &[],
    )
    .unwrap();

    let mut ctrl = HeadingController::new(&path, traj_ctrl::Params::default()).unwrap();
    let t0 = Instant::now();

    // Jump the robot past the end
    let state = odom::RobotState::at_rest(Pose::new(0.0, 13.0, 0.0));
    let powers = ctrl.update(&state, t0, &mut NullTelemetry);
    assert!(powers.path_finished);

    for i in 1..10u32 {
        let powers = ctrl.update(&state, t0 + CYCLE * i, &mut NullTelemetry);
        assert!(powers.path_finished);
        assert_eq!(powers.left_power, 0.0);
        assert_eq!(powers.right_power, 0.0);
    }
}

#[test]
fn test_s_curve_finishes() {
    let params: path::Params =
        util::params::parse(include_str!("../../params/paths/s_curve.toml")).unwrap();
    let path = Path::from_params(&params).unwrap();

    let result = run(&path, Pose::default());

    assert!(result.finished, "Path not finished after {} cycles", result.cycles);
    assert!(result.cycles < 1000);
    assert!(
        result.max_lat_error < 3.0,
        "Lateral error reached {:.3} in",
        result.max_lat_error
    );

    // The S returns to the line it started on
    let end = Point::new(0.0, 108.0);
    assert!(result.truth.position().distance_to(&end) < 2.0);
}

#[test]
fn test_bend_left_and_right() {
    for &(mirrored, end_x) in &[(false, -24.0), (true, 24.0)] {
        let result = run(&bend_path(mirrored), Pose::default());

        assert!(result.finished, "Path not finished after {} cycles", result.cycles);
        assert!(result.cycles < 1000);

        // Cutting the corner is unavoidable but it's recovered from
        assert!(result.max_lat_error > 0.5);
        assert!(
            result.max_lat_error < 3.0,
            "Lateral error reached {:.3} in",
            result.max_lat_error
        );
        assert!(settled_lat_error(&result) < 2.0);
        assert_abs_diff_eq!(result.truth.x, end_x, epsilon = 1.5);
    }
}

#[test]
fn test_start_off_path() {
    let path = Path::new(
        &[Point::new(0.0, 0.0), Point::new(0.0, 96.0)],
        20.0,
        5.0,
        &[],
    )
    .unwrap();

    // Three inches either side of the line
    for &x in &[3.0, -3.0] {
        let result = run(&path, Pose::new(x, 0.0, 0.0));

        assert!(result.finished, "Path not finished after {} cycles", result.cycles);
        assert!(result.cycles < 1000);

        // The first error is the starting offset, it only shrinks from there
        assert_abs_diff_eq!(result.lat_errors[0], x, epsilon = 1e-9);
        assert!(
            result.max_lat_error < 3.5,
            "Lateral error reached {:.3} in",
            result.max_lat_error
        );
        assert!(settled_lat_error(&result) < 1.5);
        assert!(result.truth.x.abs() < 1.5);
    }
}

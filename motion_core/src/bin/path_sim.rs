//! # Path Simulation
//!
//! This binary runs the odometry and trajectory control loop against a
//! simulated robot, following one of the paths in `params/paths`. It is
//! designed to allow quick tuning of the controllers without the robot.
//!
//! Usage: `path_sim [PATH_FILE]`, where `PATH_FILE` is relative to the
//! params directory (default `paths/straight.toml`).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    env,
    time::{Duration, Instant},
};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};

use motion_lib::{
    geom::Pose,
    odom::{self, OdometrySystem},
    path::{self, Path},
    sim::{self, DiffDriveSim},
    traj_ctrl::{self, HeadingController},
};
use util::{
    archive::{CsvTelemetry, TelemetrySink},
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period of one control cycle in simulated time.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Simulated time after which the run is abandoned if the path isn't finished.
const MAX_SIM_TIME_S: f64 = 120.0;

/// Path followed if none is given on the command line.
const DEFAULT_PATH_FILE: &str = "paths/straight.toml";

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new("path_sim", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Path Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let path_file = match args.len() {
        1 => DEFAULT_PATH_FILE,
        2 => args[1].as_str(),
        _ => return Err(eyre!("Expected at most one argument, the path file to follow")),
    };

    // ---- LOAD PARAMETERS ----

    let odom_params: odom::Params =
        util::params::load("odom.toml").wrap_err("Could not load odometry params")?;
    let traj_ctrl_params: traj_ctrl::Params =
        util::params::load("traj_ctrl.toml").wrap_err("Could not load trajectory control params")?;
    let sim_params: sim::Params =
        util::params::load("sim.toml").wrap_err("Could not load simulation params")?;
    let path_params: path::Params = util::params::load(path_file)
        .wrap_err_with(|| format!("Could not load the path from \"{}\"", path_file))?;

    // ---- MODULE INIT ----

    let path = Path::from_params(&path_params).wrap_err("Invalid path")?;
    info!(
        "Loaded path \"{}\": {} points, {:.2} in long",
        path_file,
        path.len(),
        path.total_length()
    );

    // Start at the beginning of the path facing along the first segment
    let start = *path.point(0).ok_or_else(|| eyre!("Path has no points"))?;
    let first_dir = path
        .meta(1)
        .ok_or_else(|| eyre!("Path has no first segment"))?
        .incoming;
    let start_pose = Pose::new(start.x, start.y, (-first_dir[0]).atan2(first_dir[1]));

    let mut sim = DiffDriveSim::new(sim_params, start_pose)
        .wrap_err("Failed to initialise the simulation")?;

    let t0 = Instant::now();
    let mut odom = OdometrySystem::from_pose(odom_params, sim.readings(), start_pose, t0)
        .wrap_err("Failed to initialise odometry")?;

    let mut ctrl = HeadingController::new(&path, traj_ctrl_params)
        .wrap_err("Failed to initialise trajectory control")?;

    let mut telem = CsvTelemetry::from_session(&session, "traj_ctrl.csv")
        .wrap_err("Failed to create the telemetry archive")?;

    info!("Init complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(CYCLE_PERIOD_S);
    let max_cycles = (MAX_SIM_TIME_S / CYCLE_PERIOD_S) as u32;
    let mut powers = ctrl.powers();
    let mut num_cycles = 0u32;

    while !powers.path_finished {
        if num_cycles >= max_cycles {
            warn!("Path not finished after {:.1} s of simulated time", MAX_SIM_TIME_S);
            break;
        }
        num_cycles += 1;

        // Simulated time of this cycle
        let now = t0 + cycle_period * num_cycles;

        // ---- SIMULATION PROCESSING ----

        let readings = sim.step(&powers, cycle_period);

        // ---- CONTROL PROCESSING ----

        let state = odom.update(readings, now);
        powers = ctrl.update(&state, now, &mut telem);

        // ---- TELEMETRY ----

        let truth = sim.pose();
        telem.append("sim_time_s", num_cycles as f64 * CYCLE_PERIOD_S);
        telem.append("true_x", truth.x);
        telem.append("true_y", truth.y);
        telem.append("true_heading", truth.heading);
        telem.flush().wrap_err("Failed to write telemetry")?;
    }

    // ---- REPORT ----

    let truth = sim.pose();
    let est = odom.state().position;
    let end = path
        .point(path.len() - 1)
        .ok_or_else(|| eyre!("Path has no end point"))?;

    info!(
        "Simulation ended after {} cycles ({:.2} s), path finished: {}",
        num_cycles,
        num_cycles as f64 * CYCLE_PERIOD_S,
        powers.path_finished
    );
    info!(
        "Final pose ({:.3}, {:.3}, {:.2} deg), {:.3} in from the end of the path",
        truth.x,
        truth.y,
        truth.wrapped_heading().to_degrees(),
        truth.position().distance_to(end)
    );
    info!(
        "Odometry error {:.4} in, {:.4} deg",
        truth.position().distance_to(&est.position()),
        (est.heading - truth.heading).to_degrees()
    );

    Ok(())
}

//! # Motion library.
//!
//! Dead reckoning and path following for a wheeled robot. This library allows
//! the executables, tests and benchmarks in the workspace to access the
//! control modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geometry - points, poses and velocities in the field frame
pub mod geom;

/// Odometry module - estimates the robot's state from the tracking wheels
pub mod odom;

/// Path module - the polyline and speed profile the robot follows
pub mod path;

/// Simulation - a differential drive robot for running the control loop without hardware
pub mod sim;

/// Trajectory control module - keeps the robot on the given path
pub mod traj_ctrl;

//! # Trajectory controllers module
//!
//! This module provides the PID controllers used by trajectory control: a
//! scalar PID with integral clamping, and a velocity PID which corrects the
//! speed and direction of a velocity vector separately.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Duration;
use serde::{Deserialize, Serialize};

// Internal
use crate::geom::Velocity;
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains and integral limit of a PID controller, as found in parameter files.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Limit on the magnitude of the accumulated integral, or `None` for no
    /// limit.
    #[serde(default)]
    pub integral_limit: Option<f64>
}

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// Integral accumulation limit
    integral_limit: Option<f64>,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64
}

/// The individual terms of a PID correction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct Corrections {
    pub correction_p: f64,
    pub correction_i: f64,
    pub correction_d: f64,
    pub total_correction: f64
}

/// A PID on the speed and direction of a velocity.
#[derive(Debug, Serialize, Clone)]
pub struct VelocityPid {
    speed_ctrl: PidController,
    direction_ctrl: PidController
}

/// Output of the velocity PID.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct VelocityCorrection {
    pub speed: f64,
    pub direction: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral_limit: None,
            integral: 0f64,
            prev_error: None
        }
    }

    /// Create a new controller from parameters.
    pub fn from_params(params: &PidParams) -> Self {
        let ctrl = Self::new(params.k_p, params.k_i, params.k_d);

        match params.integral_limit {
            Some(l) => ctrl.with_integral_limit(l),
            None => ctrl
        }
    }

    /// Limit the magnitude of the accumulated integral to prevent windup.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Get the correction for the given error, `dt` after the previous call.
    ///
    /// If `dt` is zero the integral is not accumulated and the derivative is
    /// taken as zero. The derivative is also zero on the first call since
    /// there is no previous error to differentiate against.
    pub fn get_correction(&mut self, error: f64, dt: Duration) -> Corrections {
        let dt_s = dt.as_secs_f64();

        // Accumulate the integral term and apply the windup limit
        self.integral += error * dt_s;
        if let Some(l) = self.integral_limit {
            self.integral = self.integral.max(-l).min(l);
        }

        // Calculate the derivative.
        let deriv = match self.prev_error {
            Some(e) if dt_s > 0f64 => (error - e) / dt_s,
            _ => 0f64
        };

        // Remember the previous error
        self.prev_error = Some(error);

        let correction_p = self.k_p * error;
        let correction_i = self.k_i * self.integral;
        let correction_d = self.k_d * deriv;

        Corrections {
            correction_p,
            correction_i,
            correction_d,
            total_correction: correction_p + correction_i + correction_d
        }
    }

    /// Clear the integral and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }

    /// The current accumulated integral.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

impl VelocityPid {
    /// Create a new velocity PID from the speed and direction gains.
    pub fn new(speed: &PidParams, direction: &PidParams) -> Self {
        Self {
            speed_ctrl: PidController::from_params(speed),
            direction_ctrl: PidController::from_params(direction)
        }
    }

    /// Get the speed and direction corrections needed to bring `current` to
    /// `target`.
    ///
    /// The direction error is wrapped so that the controller always turns the
    /// short way round.
    pub fn get_correction(
        &mut self,
        current: &Velocity,
        target: &Velocity,
        dt: Duration
    ) -> VelocityCorrection {
        let speed_err = target.speed() - current.speed();
        let direction_err = wrap_pi(target.direction() - current.direction());

        VelocityCorrection {
            speed: self.speed_ctrl.get_correction(speed_err, dt).total_correction,
            direction: self.direction_ctrl.get_correction(direction_err, dt).total_correction
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: Duration = Duration::from_millis(50);

    #[test]
    fn test_zero_gains() {
        let mut pid = PidController::new(0.0, 0.0, 0.0);

        for error in [1e9, -3.5, 0.0, 42.0].iter() {
            let c = pid.get_correction(*error, DT);
            assert_eq!(c.total_correction, 0.0);
            assert_eq!(c.correction_p, 0.0);
            assert_eq!(c.correction_i, 0.0);
            assert_eq!(c.correction_d, 0.0);
        }
    }

    #[test]
    fn test_proportional() {
        let mut pid = PidController::new(2.0, 0.0, 0.0);

        let small = pid.get_correction(1.0, DT);
        let large = pid.get_correction(10.0, DT);

        assert_eq!(small.total_correction, 2.0);
        assert_eq!(large.total_correction, 20.0);
    }

    #[test]
    fn test_integral_windup() {
        let mut pid = PidController::new(0.0, 1.0, 0.0);

        let mut prev = 0f64;
        for _ in 0..10 {
            let c = pid.get_correction(2.0, DT);
            assert!(c.correction_i > prev);
            prev = c.correction_i;
        }

        // Same with a negative error, the magnitude still grows
        pid.reset();
        let mut prev = 0f64;
        for _ in 0..10 {
            let c = pid.get_correction(-2.0, DT);
            assert!(c.correction_i.abs() > prev);
            prev = c.correction_i.abs();
        }
    }

    #[test]
    fn test_integral_limit() {
        let mut pid = PidController::new(0.0, 1.0, 0.0).with_integral_limit(0.5);

        for _ in 0..100 {
            pid.get_correction(10.0, DT);
        }
        assert_eq!(pid.integral(), 0.5);

        for _ in 0..100 {
            pid.get_correction(-10.0, DT);
        }
        assert_eq!(pid.integral(), -0.5);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidController::new(0.0, 0.0, 1.0);

        pid.get_correction(9.0, DT);
        let c = pid.get_correction(0.1, DT);

        assert!(c.correction_d < 0.0);
        assert!(c.total_correction < 0.0);
    }

    #[test]
    fn test_zero_dt() {
        let mut pid = PidController::new(1.0, 1.0, 1.0);

        pid.get_correction(9.0, Duration::from_secs(0));
        let c = pid.get_correction(0.1, Duration::from_secs(0));

        assert_eq!(c.correction_d, 0.0);
        assert_eq!(c.correction_i, 0.0);
        assert!(c.total_correction.is_finite());
    }

    #[test]
    fn test_from_params() {
        let params = PidParams { k_p: 1.0, k_i: 1.0, k_d: 0.0, integral_limit: Some(-0.1) };
        let mut pid = PidController::from_params(&params);

        for _ in 0..10 {
            pid.get_correction(1.0, DT);
        }

        // Negative limits are treated by magnitude
        assert_eq!(pid.integral(), 0.1);
    }

    #[test]
    fn test_velocity_pid() {
        let gains = PidParams { k_p: 1.0, k_i: 0.0, k_d: 0.0, integral_limit: None };
        let mut pid = VelocityPid::new(&gains, &gains);

        let velocity = Velocity::from_speed_direction(1.0, 1.0);

        // No error gives no correction
        let c = pid.get_correction(&velocity, &velocity, DT);
        assert!(c.speed.abs() < 1e-12);
        assert!(c.direction.abs() < 1e-12);

        // Further from the target gives a larger correction
        let small = pid.get_correction(&velocity, &Velocity::from_speed_direction(2.0, 2.0), DT);
        let large = pid.get_correction(&velocity, &Velocity::from_speed_direction(3.0, 2.5), DT);
        assert!(large.speed > small.speed);
        assert!(large.direction > small.direction);

        // Direction errors across the +/-pi boundary take the short way round
        let current = Velocity::from_speed_direction(1.0, 3.0);
        let target = Velocity::from_speed_direction(1.0, -3.0);
        let c = pid.get_correction(&current, &target, DT);
        assert!(c.direction > 0.0);
        assert!(c.direction < 1.0);
    }
}

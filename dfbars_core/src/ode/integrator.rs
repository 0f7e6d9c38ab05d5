//! Integrators of the continuous model, both backed by `ode_solvers`

use nalgebra::DVector;
use ode_solvers::System;
use thiserror::Error;

/// State vector of a continuous model
pub type State = DVector<f64>;

/// Relative amount by which output spacing and fixed steps are adjusted, so that rounding in
/// `t0 + n * step` neither skips the end point nor adds a step past it
const END_MARGIN: f64 = 1e-12;

/// Advances an `ode_solvers` [`System`] over an interval
pub trait Integrator {
    /// Integrate from `y0` at `t0` to `t1`, returning the state at `t1`
    fn integrate<F: System<f64, State>>(
        &self,
        system: F,
        y0: &State,
        t0: f64,
        t1: f64,
    ) -> Result<State, IntegrationError>;

    /// Update the error tolerances, integrators without error control ignore this
    fn set_tolerances(&mut self, absolute: f64, relative: f64);
}

/// Length of `[t0, t1]`
fn interval_span(t0: f64, t1: f64) -> Result<f64, IntegrationError> {
    if !t0.is_finite() || !t1.is_finite() || t1 < t0 {
        return Err(IntegrationError::InvalidInterval { start: t0, end: t1 });
    }
    Ok(t1 - t0)
}

/// Last output of a stepper, which has to sit at `t1`
fn final_state(
    x_out: &[f64],
    y_out: &[State],
    t0: f64,
    t1: f64,
) -> Result<State, IntegrationError> {
    let span = t1 - t0;
    match (x_out.last(), y_out.last()) {
        (Some(&x), Some(y)) if (x - t1).abs() <= 1e3 * END_MARGIN * span.max(1.) => {
            if y.iter().all(|v| v.is_finite()) {
                Ok(y.clone())
            } else {
                Err(IntegrationError::NonFinite { time: x })
            }
        }
        (x, _) => Err(IntegrationError::IncompleteOutput {
            reached: x.copied().unwrap_or(t0),
            end: t1,
        }),
    }
}

// region Dormand-Prince
/// Adaptive Dormand-Prince 5(4) integrator, [`ode_solvers::Dopri5`]
#[derive(Debug, Clone, PartialEq)]
pub struct DormandPrince {
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-6,
            relative_tolerance: 1e-6,
        }
    }
}

impl DormandPrince {
    pub fn with_tolerances(absolute: f64, relative: f64) -> Self {
        Self {
            absolute_tolerance: absolute,
            relative_tolerance: relative,
        }
    }
}

impl Integrator for DormandPrince {
    fn integrate<F: System<f64, State>>(
        &self,
        system: F,
        y0: &State,
        t0: f64,
        t1: f64,
    ) -> Result<State, IntegrationError> {
        let span = interval_span(t0, t1)?;
        if !(self.absolute_tolerance > 0. && self.relative_tolerance > 0.) {
            return Err(IntegrationError::InvalidTolerances {
                absolute: self.absolute_tolerance,
                relative: self.relative_tolerance,
            });
        }
        if span == 0. {
            return Ok(y0.clone());
        }
        // A single dense output point, just short of t1
        let mut stepper = ode_solvers::Dopri5::new(
            system,
            t0,
            t1,
            span * (1. - END_MARGIN),
            y0.clone(),
            self.relative_tolerance,
            self.absolute_tolerance,
        );
        let stats = stepper
            .integrate()
            .map_err(|error| IntegrationError::Solver(error.to_string()))?;
        tracing::trace!(evaluations = stats.num_eval, "Dormand-Prince interval done");
        final_state(stepper.x_out(), stepper.y_out(), t0, t1)
    }

    fn set_tolerances(&mut self, absolute: f64, relative: f64) {
        self.absolute_tolerance = absolute;
        self.relative_tolerance = relative;
    }
}
// endregion Dormand-Prince

// region RK4
/// Classical fixed step Runge-Kutta integrator, [`ode_solvers::Rk4`]
///
/// The interval is divided into the smallest number of equal steps not longer than `step`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rk4 {
    pub step: f64,
}

impl Integrator for Rk4 {
    fn integrate<F: System<f64, State>>(
        &self,
        system: F,
        y0: &State,
        t0: f64,
        t1: f64,
    ) -> Result<State, IntegrationError> {
        let span = interval_span(t0, t1)?;
        if !(self.step.is_finite() && self.step > 0.) {
            return Err(IntegrationError::InvalidStep(self.step));
        }
        if span == 0. {
            return Ok(y0.clone());
        }
        let n = (span / self.step).ceil().max(1.);
        let step = span / n * (1. + END_MARGIN);
        let mut stepper = ode_solvers::Rk4::new(system, t0, y0.clone(), t1, step);
        stepper
            .integrate()
            .map_err(|error| IntegrationError::Solver(error.to_string()))?;
        final_state(stepper.x_out(), stepper.y_out(), t0, t1)
    }

    fn set_tolerances(&mut self, _absolute: f64, _relative: f64) {}
}
// endregion RK4

/// Failures of the numerical integration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("Invalid integration interval [{start}, {end}]")]
    InvalidInterval { start: f64, end: f64 },
    #[error("Step size must be positive and finite, got {0}")]
    InvalidStep(f64),
    #[error("Tolerances must be positive, got absolute {absolute} and relative {relative}")]
    InvalidTolerances { absolute: f64, relative: f64 },
    #[error("ODE solver failed: {0}")]
    Solver(String),
    #[error("State is not finite at t = {time}")]
    NonFinite { time: f64 },
    #[error("Integration stopped at t = {reached} before reaching {end}")]
    IncompleteOutput { reached: f64, end: f64 },
}

//! Settings of a single simulation run
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::dfba::error::ConfigurationError;

/// How fluxes are chosen among the optima of the flux problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationMode {
    /// Plain flux balance analysis, the first optimum reported by the solver
    Fba,
    /// The optimum with the smallest total absolute flux
    Pfba,
}

/// Time horizon, tolerances and optimization options of a run
///
/// # Examples
/// ```rust
/// use dfbars_core::dfba::settings::SimulationSettingsBuilder;
/// let settings = SimulationSettingsBuilder::default()
///     .tend(24.)
///     .dt(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(settings.steps().unwrap(), 48);
/// assert!(SimulationSettingsBuilder::default().dt(-1.).build().is_err());
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct SimulationSettings {
    pub tstart: f64,
    pub tend: f64,
    /// Fixed coupling step
    pub dt: f64,
    /// Absolute tolerance of the integrator, also used for snapping bounds to zero
    pub abs_tol: f64,
    /// Relative tolerance of the integrator
    pub rel_tol: f64,
    pub optimization_mode: OptimizationMode,
    /// Run flux variability analysis every step to flag non-unique optima
    pub check_uniqueness: bool,
    /// Largest mean flux range for which an optimum counts as unique
    pub uniqueness_tolerance: f64,
    /// Restore initial values before running, `false` continues from the previous run
    pub reset: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tstart: 0.,
            tend: 10.,
            dt: 0.1,
            abs_tol: 1e-6,
            rel_tol: 1e-6,
            optimization_mode: OptimizationMode::Pfba,
            check_uniqueness: true,
            uniqueness_tolerance: 1e-6,
            reset: true,
        }
    }
}

impl SimulationSettingsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(dt) = self.dt {
            if !(dt.is_finite() && dt > 0.) {
                return Err(format!("dt must be positive and finite, got {dt}"));
            }
        }
        let defaults = SimulationSettings::default();
        SimulationSettings {
            abs_tol: self.abs_tol.unwrap_or(defaults.abs_tol),
            rel_tol: self.rel_tol.unwrap_or(defaults.rel_tol),
            uniqueness_tolerance: self
                .uniqueness_tolerance
                .unwrap_or(defaults.uniqueness_tolerance),
            ..defaults
        }
        .check_tolerances()
        .map_err(|e| e.to_string())
    }
}

fn check_tolerance(name: &'static str, value: f64, allow_zero: bool) -> Result<(), ConfigurationError> {
    if value.is_finite() && (value > 0. || (allow_zero && value == 0.)) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidTolerance { name, value })
    }
}

impl SimulationSettings {
    /// Integrator tolerances have to be positive, the uniqueness tolerance non-negative
    pub fn check_tolerances(&self) -> Result<(), ConfigurationError> {
        check_tolerance("abs_tol", self.abs_tol, false)?;
        check_tolerance("rel_tol", self.rel_tol, false)?;
        check_tolerance("uniqueness_tolerance", self.uniqueness_tolerance, true)
    }

    /// Number of coupling steps over the horizon
    ///
    /// The horizon has to be a whole multiple of `dt` up to `abs_tol`.
    pub fn steps(&self) -> Result<usize, ConfigurationError> {
        self.check_tolerances()?;
        if !(self.dt.is_finite() && self.dt > 0.) {
            return Err(ConfigurationError::InvalidStepSize(self.dt));
        }
        let horizon = self.tend - self.tstart;
        if !(horizon.is_finite() && horizon > 0.) {
            return Err(ConfigurationError::InvalidHorizon {
                start: self.tstart,
                end: self.tend,
            });
        }
        let steps = (horizon / self.dt).round();
        if (steps * self.dt - horizon).abs() > self.abs_tol {
            return Err(ConfigurationError::HorizonNotDivisible {
                horizon,
                dt: self.dt,
            });
        }
        Ok(steps as usize)
    }

    /// Time of the `step`-th coupling point
    pub fn time_at(&self, step: usize) -> f64 {
        self.tstart + step as f64 * self.dt
    }
}

//! Errors of the coupling loop

use thiserror::Error;

use crate::flux_analysis::FluxAnalysisError;
use crate::ode::integrator::IntegrationError;
use crate::optimize::OptimizationStatus;

/// Invalid simulation setup, raised before any state is touched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Step size must be positive and finite, got {0}")]
    InvalidStepSize(f64),
    #[error("End time {end} must be after start time {start}")]
    InvalidHorizon { start: f64, end: f64 },
    #[error("Step size {dt} does not evenly divide the horizon {horizon}")]
    HorizonNotDivisible { horizon: f64, dt: f64 },
    #[error("Tolerance {name} out of range, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
    #[error("Continuation run uses dt = {requested}, previous run used dt = {previous}")]
    DtMismatch { previous: f64, requested: f64 },
    #[error("Unknown {kind} id: {id}")]
    UnknownIdentifier { kind: &'static str, id: String },
    #[error("Exchange reaction {0} has no bound mapping")]
    UnmappedExchange(String),
    #[error("Reaction {0} is mapped more than once")]
    DuplicateMapping(String),
    #[error("Conversion factor must be positive and finite, got {0}")]
    InvalidConversionFactor(f64),
}

/// Why a coupling step could not be completed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("the flux problem is infeasible")]
    Infeasible,
    #[error("the flux problem is unbounded")]
    Unbounded,
    #[error("the solver stopped without optimum ({0:?})")]
    NoOptimum(OptimizationStatus),
    #[error("flux analysis failed: {0}")]
    FluxAnalysis(#[from] FluxAnalysisError),
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
}

impl FailureReason {
    pub(crate) fn from_status(status: OptimizationStatus) -> Self {
        match status {
            OptimizationStatus::Infeasible => FailureReason::Infeasible,
            OptimizationStatus::Unbounded => FailureReason::Unbounded,
            other => FailureReason::NoOptimum(other),
        }
    }
}

/// The step at which a run was aborted
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Step {step} at t = {time} failed: {reason}")]
pub struct StepFailure {
    pub step: usize,
    pub time: f64,
    pub reason: FailureReason,
}

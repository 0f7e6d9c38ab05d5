//! Dynamic flux balance analysis
//!
//! A [`coupler::DfbaCoupler`] alternates between a steady state flux model and a continuous
//! model of the extracellular pools. Each step the pools bound the exchange fluxes, the flux
//! model is optimized, the fluxes drive the pools over the step and the result is recorded.

pub mod accumulator;
pub mod bounds;
pub mod collaborators;
pub mod coupler;
pub mod error;
pub mod fba_model;
pub mod injector;
pub mod optimization;
pub mod settings;

pub use accumulator::{SimulationTrace, TimeStepRecord, UniquenessSummary};
pub use bounds::{BoundsTranslator, ExchangeBinding, KineticLimit};
pub use collaborators::{ContinuousModel, OptimizationModel};
pub use coupler::{CouplingBindings, CouplingBindingsBuilder, DfbaCoupler, SimulationOutcome};
pub use error::{ConfigurationError, FailureReason, StepFailure};
pub use fba_model::FbaModel;
pub use settings::{OptimizationMode, SimulationSettings, SimulationSettingsBuilder};

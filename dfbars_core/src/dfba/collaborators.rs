//! Interfaces the coupler requires from the optimization model and the continuous model
//!
//! Identifiers are resolved once, when the coupler is built, into the index handles defined
//! here. All per step traffic between the coupler and its collaborators uses these handles.

use serde::{Deserialize, Serialize};

use crate::dfba::error::ConfigurationError;
use crate::flux_analysis::{FluxAnalysisError, FluxVector, OptimalityRange};
use crate::metabolic_model::reaction::FluxBounds;
use crate::ode::integrator::IntegrationError;

// region Handles
macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }

            /// Look `id` up in the declared `ids`
            pub fn resolve<S: AsRef<str>>(ids: &[S], id: &str) -> Result<Self, ConfigurationError> {
                ids.iter()
                    .position(|candidate| candidate.as_ref() == id)
                    .map($name)
                    .ok_or_else(|| ConfigurationError::UnknownIdentifier {
                        kind: $kind,
                        id: id.to_string(),
                    })
            }
        }
    };
}

index_handle!(
    /// Position of a reaction in [`OptimizationModel::reaction_ids`]
    ReactionIdx,
    "reaction"
);
index_handle!(
    /// Position of a state variable in [`ContinuousModel::variable_ids`]
    SpeciesIdx,
    "state variable"
);
index_handle!(
    /// Position of a parameter in [`ContinuousModel::parameter_ids`]
    ParameterIdx,
    "parameter"
);
index_handle!(
    /// Position of a flux tracking column in [`ContinuousModel::flux_column_ids`]
    ColumnIdx,
    "flux column"
);
// endregion Handles

/// Secondary objective applied after the primary optimum has been found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondaryObjective {
    /// Minimize the sum of absolute fluxes at the primary optimum
    MinimizeTotalFlux,
}

/// The steady state flux model
pub trait OptimizationModel {
    /// Ids of every reaction, `FluxVector::fluxes` follows this order
    fn reaction_ids(&self) -> Vec<String>;

    /// Ids of the reactions exchanging metabolites with the environment
    fn exchange_reaction_ids(&self) -> Vec<String>;

    /// Bounds the reaction was declared with
    fn default_bounds(&self, reaction: ReactionIdx) -> FluxBounds;

    /// Install bounds for the next optimization
    fn set_bounds(&mut self, reaction: ReactionIdx, bounds: FluxBounds);

    /// Optimize under the installed bounds
    ///
    /// A problem without optimum is reported through [`FluxVector::status`], errors are reserved
    /// for failures of the solver itself.
    fn optimize(
        &mut self,
        secondary: Option<SecondaryObjective>,
    ) -> Result<FluxVector, FluxAnalysisError>;

    /// Flux range of every reaction with the objective pinned at its optimum
    fn flux_variability(&mut self, optimum_slack: f64)
        -> Result<OptimalityRange, FluxAnalysisError>;
}

/// Values of the continuous model at one time point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub time: f64,
    /// Values of the state variables, ordered like [`ContinuousModel::variable_ids`]
    pub state: Vec<f64>,
    /// Flux tracking columns as computed by the continuous model itself
    pub flux_columns: Vec<f64>,
}

/// Snapshots at both ends of an integration interval
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSnapshots {
    pub start: StateSnapshot,
    pub end: StateSnapshot,
}

/// The continuously evolving part of the system
pub trait ContinuousModel {
    fn variable_ids(&self) -> Vec<String>;

    fn parameter_ids(&self) -> Vec<String>;

    fn flux_column_ids(&self) -> Vec<String>;

    /// Restore the declared initial values of state and parameters
    fn reset(&mut self);

    fn set_parameter(&mut self, parameter: ParameterIdx, value: f64);

    fn configure_integrator_tolerances(&mut self, absolute: f64, relative: f64);

    /// Advance the current state from `start` to `end`
    fn integrate(&mut self, start: f64, end: f64) -> Result<IntervalSnapshots, IntegrationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_handles() {
        let ids = vec!["EX_A".to_string(), "R1".to_string()];
        assert_eq!(ReactionIdx::resolve(&ids, "R1").unwrap().index(), 1);
        assert!(matches!(
            ParameterIdx::resolve(&ids, "missing"),
            Err(ConfigurationError::UnknownIdentifier { kind: "parameter", id }) if id == "missing"
        ));
    }
}

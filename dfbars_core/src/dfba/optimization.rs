//! Per step optimization with the optional uniqueness diagnostic
use crate::dfba::collaborators::{OptimizationModel, SecondaryObjective};
use crate::dfba::error::FailureReason;
use crate::dfba::settings::{OptimizationMode, SimulationSettings};
use crate::flux_analysis::{FluxVector, OptimalityRange, OPTIMUM_SLACK};

/// Result of the optimization of one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOptimum {
    pub fluxes: FluxVector,
    /// Flux ranges at the optimum, when the diagnostic is enabled
    pub range: Option<OptimalityRange>,
    /// Whether the optimum is unique, when the diagnostic is enabled
    pub unique: Option<bool>,
}

impl StepOptimum {
    pub fn non_uniqueness(&self) -> Option<f64> {
        self.range.as_ref().map(OptimalityRange::non_uniqueness)
    }
}

/// Solves the flux problem of a step
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationStep {
    pub mode: OptimizationMode,
    pub check_uniqueness: bool,
    pub uniqueness_tolerance: f64,
}

impl OptimizationStep {
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self {
            mode: settings.optimization_mode,
            check_uniqueness: settings.check_uniqueness,
            uniqueness_tolerance: settings.uniqueness_tolerance,
        }
    }

    /// Optimize the model under its installed bounds
    ///
    /// A problem without optimum fails the step. The uniqueness diagnostic only annotates the
    /// result, the returned fluxes are those of the (parsimonious) optimization.
    pub fn run<O: OptimizationModel + ?Sized>(
        &self,
        model: &mut O,
    ) -> Result<StepOptimum, FailureReason> {
        let secondary = match self.mode {
            OptimizationMode::Fba => None,
            OptimizationMode::Pfba => Some(SecondaryObjective::MinimizeTotalFlux),
        };
        let fluxes = model.optimize(secondary)?;
        if !fluxes.is_optimal() {
            return Err(FailureReason::from_status(fluxes.status));
        }
        let range = if self.check_uniqueness {
            Some(model.flux_variability(OPTIMUM_SLACK)?)
        } else {
            None
        };
        let unique = range
            .as_ref()
            .map(|r| r.is_unique(self.uniqueness_tolerance));
        if unique == Some(false) {
            tracing::warn!(
                non_uniqueness = range.as_ref().map(OptimalityRange::non_uniqueness),
                "Optimum is not unique"
            );
        }
        Ok(StepOptimum {
            fluxes,
            range,
            unique,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Solver;
    use crate::dfba::collaborators::ReactionIdx;
    use crate::dfba::fba_model::FbaModel;
    use crate::dfba::settings::SimulationSettingsBuilder;
    use crate::flux_analysis::test_models::{parallel_pathways, single_pathway};
    use crate::metabolic_model::reaction::FluxBounds;
    use crate::optimize::OptimizationStatus;

    fn step(check_uniqueness: bool) -> OptimizationStep {
        OptimizationStep::from_settings(
            &SimulationSettingsBuilder::default()
                .check_uniqueness(check_uniqueness)
                .build()
                .unwrap(),
        )
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn parallel_pathways_flagged_non_unique() {
        let mut model = FbaModel::new(parallel_pathways())
            .unwrap()
            .with_solver(Solver::Microlp);
        let optimum = step(true).run(&mut model).unwrap();
        assert_eq!(optimum.unique, Some(false));
        assert!(optimum.non_uniqueness().unwrap() > 1e-6);
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn single_pathway_flagged_unique() {
        let mut model = FbaModel::new(single_pathway())
            .unwrap()
            .with_solver(Solver::Microlp);
        let optimum = step(true).run(&mut model).unwrap();
        assert_eq!(optimum.unique, Some(true));
        assert!(optimum.non_uniqueness().unwrap() < 1e-6);
    }

    #[test]
    fn diagnostic_disabled() {
        let mut model = FbaModel::new(single_pathway())
            .unwrap()
            .with_solver(Solver::Clarabel);
        let optimum = step(false).run(&mut model).unwrap();
        assert!(optimum.range.is_none());
        assert!(optimum.unique.is_none());
        assert_eq!(optimum.fluxes.status, OptimizationStatus::Optimal);
    }

    #[test]
    fn infeasible_fails_step() {
        let mut model = FbaModel::new(single_pathway())
            .unwrap()
            .with_solver(Solver::Clarabel);
        let ids = model.reaction_ids();
        let ex_a = ReactionIdx::resolve(&ids, "EX_A").unwrap();
        let ex_b = ReactionIdx::resolve(&ids, "EX_B").unwrap();
        model.set_bounds(ex_a, FluxBounds::new(0., 0.));
        model.set_bounds(ex_b, FluxBounds::new(1., 1000.));
        let res = step(false).run(&mut model);
        assert!(res.is_err());
    }
}

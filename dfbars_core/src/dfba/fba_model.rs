//! Optimization collaborator backed by a metabolic [`Model`]
use crate::configuration::{self, Solver};
use crate::dfba::collaborators::{OptimizationModel, ReactionIdx, SecondaryObjective};
use crate::flux_analysis::{
    fba, flux_variability_analysis, pfba, FluxAnalysisError, FluxVector, OptimalityRange,
};
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::FluxBounds;

/// A metabolic model together with the bounds installed for the next optimization
#[derive(Debug, Clone)]
pub struct FbaModel {
    model: Model,
    bounds: Vec<FluxBounds>,
    solver: Solver,
}

impl FbaModel {
    /// Wrap a model, using the default solver from the global configuration
    pub fn new(model: Model) -> Result<Self, ModelError> {
        model.validate()?;
        Ok(Self {
            bounds: model.reaction_bounds(),
            model,
            solver: configuration::current().solver,
        })
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    /// Currently installed bounds, in model order
    pub fn bounds(&self) -> &[FluxBounds] {
        &self.bounds
    }

    /// Reinstall the bounds declared on the reactions
    pub fn restore_default_bounds(&mut self) {
        self.bounds = self.model.reaction_bounds();
    }
}

impl OptimizationModel for FbaModel {
    fn reaction_ids(&self) -> Vec<String> {
        self.model.reactions.keys().cloned().collect()
    }

    fn exchange_reaction_ids(&self) -> Vec<String> {
        self.model
            .exchanges()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn default_bounds(&self, reaction: ReactionIdx) -> FluxBounds {
        self.model
            .reactions
            .get_index(reaction.index())
            .map(|(_, r)| r.bounds())
            .unwrap_or_else(|| FluxBounds::new(0., 0.))
    }

    fn set_bounds(&mut self, reaction: ReactionIdx, bounds: FluxBounds) {
        if let Some(slot) = self.bounds.get_mut(reaction.index()) {
            *slot = bounds;
        }
    }

    fn optimize(
        &mut self,
        secondary: Option<SecondaryObjective>,
    ) -> Result<FluxVector, FluxAnalysisError> {
        match secondary {
            None => fba(&self.model, &self.bounds, self.solver),
            Some(SecondaryObjective::MinimizeTotalFlux) => pfba(&self.model, &self.bounds, self.solver),
        }
    }

    fn flux_variability(
        &mut self,
        optimum_slack: f64,
    ) -> Result<OptimalityRange, FluxAnalysisError> {
        flux_variability_analysis(&self.model, &self.bounds, optimum_slack, self.solver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_analysis::test_models::single_pathway;

    #[test]
    fn bounds_roundtrip() {
        let mut model = FbaModel::new(single_pathway())
            .unwrap()
            .with_solver(Solver::Clarabel);
        let ids = model.reaction_ids();
        assert_eq!(ids, vec!["EX_A", "R1", "R2", "EX_B"]);
        assert_eq!(model.exchange_reaction_ids(), vec!["EX_A", "EX_B"]);
        let ex_a = ReactionIdx::resolve(&ids, "EX_A").unwrap();
        assert_eq!(model.default_bounds(ex_a), FluxBounds::new(-10., 0.));

        model.set_bounds(ex_a, FluxBounds::new(-2., 0.));
        let result = model.optimize(None).unwrap();
        assert!((result.objective_value.unwrap() - 2.).abs() < 1e-5);

        model.restore_default_bounds();
        assert_eq!(model.bounds()[0], FluxBounds::new(-10., 0.));
        let result = model
            .optimize(Some(SecondaryObjective::MinimizeTotalFlux))
            .unwrap();
        assert!((result.objective_value.unwrap() - 10.).abs() < 1e-4);
    }

    #[test]
    fn empty_model_rejected() {
        assert_eq!(
            FbaModel::new(Model::new_empty()).unwrap_err(),
            ModelError::Empty
        );
    }
}

//! Flux balance analysis
use crate::configuration::Solver;
use crate::flux_analysis::{FluxAnalysisError, FluxProblem, FluxVector};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::FluxBounds;

/// Optimize the model objective under the given reaction bounds
///
/// `bounds` must hold one entry per reaction, in model order. An infeasible or unbounded problem
/// is not an error, the returned [`FluxVector`] carries the solver status instead.
///
/// # Examples
/// ```rust
/// use dfbars_core::configuration::Solver;
/// use dfbars_core::flux_analysis::fba;
/// use dfbars_core::metabolic_model::model::Model;
/// use dfbars_core::metabolic_model::reaction::ReactionBuilder;
/// let mut model = Model::new_empty();
/// model.add_reaction(ReactionBuilder::default().id("EX_A").metabolite("A", -1.)
///     .lower_bound(-5.).upper_bound(0.).build().unwrap());
/// model.add_reaction(ReactionBuilder::default().id("growth").metabolite("A", -1.)
///     .lower_bound(0.).build().unwrap());
/// model.set_objective_coefficient("growth", 1.).unwrap();
/// let result = fba(&model, &model.reaction_bounds(), Solver::Clarabel).unwrap();
/// assert!((result.objective_value.unwrap() - 5.).abs() < 1e-5);
/// ```
pub fn fba(
    model: &Model,
    bounds: &[FluxBounds],
    solver: Solver,
) -> Result<FluxVector, FluxAnalysisError> {
    let problem = FluxProblem::new(model, bounds)?;
    solve_primary(&problem, solver)
}

/// Solve the problem with its primary objective
pub(crate) fn solve_primary(
    problem: &FluxProblem,
    solver: Solver,
) -> Result<FluxVector, FluxAnalysisError> {
    let solution = problem.problem().solve(solver)?;
    Ok(problem.flux_vector(&solution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_analysis::test_models::{parallel_pathways, single_pathway};
    use crate::optimize::OptimizationStatus;
    use approx::assert_abs_diff_eq;

    #[test]
    fn single_pathway_clarabel() {
        let model = single_pathway();
        let result = fba(&model, &model.reaction_bounds(), Solver::Clarabel).unwrap();
        assert!(result.is_optimal());
        assert_abs_diff_eq!(result.objective_value.unwrap(), 10., epsilon = 1e-5);
        assert_abs_diff_eq!(result.flux("R1").unwrap(), 10., epsilon = 1e-5);
        assert_abs_diff_eq!(result.flux("EX_A").unwrap(), -10., epsilon = 1e-5);
        assert_abs_diff_eq!(result.flux("R2").unwrap(), 0., epsilon = 1e-5);
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn parallel_pathways_microlp() {
        let model = parallel_pathways();
        let result = fba(&model, &model.reaction_bounds(), Solver::Microlp).unwrap();
        assert_abs_diff_eq!(result.objective_value.unwrap(), 10., epsilon = 1e-7);
        let total = result.flux("R1").unwrap() + result.flux("R2").unwrap();
        assert_abs_diff_eq!(total, 10., epsilon = 1e-7);
    }

    #[test]
    fn infeasible_bounds_reported_as_status() {
        let model = single_pathway();
        let mut bounds = model.reaction_bounds();
        // Force secretion of B without any uptake of A
        bounds[0] = FluxBounds::new(0., 0.);
        bounds[3] = FluxBounds::new(1., 1000.);
        let result = fba(&model, &bounds, Solver::Clarabel).unwrap();
        assert!(!result.is_optimal());
        assert_ne!(result.status, OptimizationStatus::Optimal);
        assert!(result.fluxes.is_empty());
        assert!(result.objective_value.is_none());
    }

    #[test]
    fn wrong_bounds_length() {
        let model = single_pathway();
        let res = fba(&model, &[FluxBounds::new(0., 1.)], Solver::Clarabel);
        assert!(matches!(res, Err(FluxAnalysisError::Model(_))));
    }
}

//! Parsimonious flux balance analysis
use crate::configuration::Solver;
use crate::flux_analysis::fba::solve_primary;
use crate::flux_analysis::{FluxAnalysisError, FluxProblem, FluxVector, OPTIMUM_SLACK};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::FluxBounds;
use crate::optimize::objective::{Objective, ObjectiveSense};

/// Find the optimum of the model objective with the smallest total absolute flux
///
/// The model objective is first optimized, then pinned at its optimal value while the sum of the
/// forward and reverse parts of every flux is minimized. When the first optimization fails its
/// status is returned unchanged.
pub fn pfba(
    model: &Model,
    bounds: &[FluxBounds],
    solver: Solver,
) -> Result<FluxVector, FluxAnalysisError> {
    let mut problem = FluxProblem::new(model, bounds)?;
    let primary = solve_primary(&problem, solver)?;
    let optimum = match primary.objective_value {
        Some(value) if primary.is_optimal() => value,
        _ => return Ok(primary),
    };
    tracing::debug!(optimum, "Fixing primary objective for total flux minimization");
    minimize_total_flux(&mut problem, optimum, OPTIMUM_SLACK.max(solver.precision()))?;

    let solution = problem.problem().solve(solver)?;
    Ok(problem.flux_vector(&solution))
}

/// Pin the primary objective and replace it with the total flux
fn minimize_total_flux(
    problem: &mut FluxProblem,
    optimum: f64,
    slack: f64,
) -> Result<(), FluxAnalysisError> {
    problem.fix_primary_objective(optimum, slack)?;
    let mut total_flux = Objective::new(ObjectiveSense::Minimize);
    let variables: Vec<usize> = problem.split_variables().collect();
    total_flux.add_linear_terms(&variables, &vec![1.; variables.len()]);
    problem.problem_mut().set_objective(total_flux)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_analysis::fba;
    use crate::flux_analysis::test_models::short_and_long_route;
    use approx::assert_abs_diff_eq;

    fn check_short_route(solver: Solver, epsilon: f64) {
        let model = short_and_long_route();
        let result = pfba(&model, &model.reaction_bounds(), solver).unwrap();
        assert!(result.is_optimal());
        assert_abs_diff_eq!(result.objective_value.unwrap(), 10., epsilon = epsilon);
        // The one step route carries everything
        assert_abs_diff_eq!(result.flux("R1").unwrap(), 10., epsilon = epsilon);
        assert_abs_diff_eq!(result.flux("R2").unwrap(), 0., epsilon = epsilon);
        assert_abs_diff_eq!(result.flux("R3").unwrap(), 0., epsilon = epsilon);
    }

    #[test]
    fn prefers_short_route_clarabel() {
        check_short_route(Solver::Clarabel, 1e-4);
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn prefers_short_route_microlp() {
        check_short_route(Solver::Microlp, 1e-7);
    }

    #[test]
    fn same_objective_as_fba() {
        let model = short_and_long_route();
        let bounds = model.reaction_bounds();
        let plain = fba(&model, &bounds, Solver::Clarabel).unwrap();
        let parsimonious = pfba(&model, &bounds, Solver::Clarabel).unwrap();
        assert_abs_diff_eq!(
            plain.objective_value.unwrap(),
            parsimonious.objective_value.unwrap(),
            epsilon = 1e-4
        );
    }
}

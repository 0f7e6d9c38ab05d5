//! Flux variability analysis
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::configuration::Solver;
use crate::flux_analysis::fba::solve_primary;
use crate::flux_analysis::{FluxAnalysisError, FluxProblem};
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::FluxBounds;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::OptimizationStatus;

/// Minimum and maximum flux of a reaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl FluxRange {
    pub fn spread(&self) -> f64 {
        self.maximum - self.minimum
    }
}

/// Range of every reaction flux compatible with the optimum of the model objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalityRange {
    pub ranges: IndexMap<String, FluxRange>,
}

impl OptimalityRange {
    pub fn get(&self, reaction_id: &str) -> Option<&FluxRange> {
        self.ranges.get(reaction_id)
    }

    /// Mean spread (maximum - minimum) over all reactions
    pub fn non_uniqueness(&self) -> f64 {
        if self.ranges.is_empty() {
            return 0.;
        }
        self.ranges.values().map(FluxRange::spread).sum::<f64>() / self.ranges.len() as f64
    }

    /// Whether the optimum is unique up to `tolerance`
    pub fn is_unique(&self, tolerance: f64) -> bool {
        self.non_uniqueness() < tolerance
    }
}

/// Compute, for every reaction, the flux range consistent with the optimal objective value
///
/// The objective is pinned at its optimum within a relative `optimum_slack`, widened to the
/// [`Solver::precision`] of the back-end when that is coarser. Fails with
/// [`FluxAnalysisError::NotOptimal`] when the model itself can't be optimized.
pub fn flux_variability_analysis(
    model: &Model,
    bounds: &[FluxBounds],
    optimum_slack: f64,
    solver: Solver,
) -> Result<OptimalityRange, FluxAnalysisError> {
    let mut problem = FluxProblem::new(model, bounds)?;
    let primary = solve_primary(&problem, solver)?;
    let optimum = match primary.objective_value {
        Some(value) if primary.is_optimal() => value,
        _ => return Err(FluxAnalysisError::NotOptimal(primary.status)),
    };
    problem.fix_primary_objective(optimum, optimum_slack.max(solver.precision()))?;

    let mut ranges = IndexMap::with_capacity(problem.num_reactions());
    for pos in 0..problem.num_reactions() {
        let minimum = extreme_flux(&mut problem, pos, ObjectiveSense::Minimize, solver)?;
        let maximum = extreme_flux(&mut problem, pos, ObjectiveSense::Maximize, solver)?;
        ranges.insert(
            problem.reaction_ids()[pos].clone(),
            FluxRange { minimum, maximum },
        );
    }
    Ok(OptimalityRange { ranges })
}

/// Optimize the net flux of a single reaction
fn extreme_flux(
    problem: &mut FluxProblem,
    reaction: usize,
    sense: ObjectiveSense,
    solver: Solver,
) -> Result<f64, FluxAnalysisError> {
    let (variables, coefficients) = problem.net_flux_terms(reaction);
    let mut objective = Objective::new(sense);
    objective.add_linear_terms(&variables, &coefficients);
    problem.problem_mut().set_objective(objective)?;
    let solution = problem.problem().solve(solver)?;
    match (solution.status, &solution.variable_values) {
        (OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal, Some(values)) => {
            Ok(values[variables[0]] - values[variables[1]])
        }
        (OptimizationStatus::Unbounded, _) => Ok(match sense {
            ObjectiveSense::Minimize => f64::NEG_INFINITY,
            ObjectiveSense::Maximize => f64::INFINITY,
        }),
        (status, _) => Err(FluxAnalysisError::NotOptimal(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_analysis::test_models::{parallel_pathways, single_pathway};
    use crate::flux_analysis::OPTIMUM_SLACK;
    use approx::assert_abs_diff_eq;

    #[test]
    fn non_uniqueness_mean_spread() {
        let range = OptimalityRange {
            ranges: IndexMap::from([
                ("a".to_string(), FluxRange { minimum: 0., maximum: 4. }),
                ("b".to_string(), FluxRange { minimum: 1., maximum: 1. }),
            ]),
        };
        assert_abs_diff_eq!(range.non_uniqueness(), 2., epsilon = 1e-12);
        assert!(!range.is_unique(1e-6));
        let empty = OptimalityRange {
            ranges: IndexMap::new(),
        };
        assert!(empty.is_unique(1e-6));
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn parallel_pathways_are_not_unique() {
        let model = parallel_pathways();
        let range = flux_variability_analysis(
            &model,
            &model.reaction_bounds(),
            OPTIMUM_SLACK,
            Solver::Microlp,
        )
        .unwrap();
        let r1 = range.get("R1").unwrap();
        assert_abs_diff_eq!(r1.minimum, 0., epsilon = 1e-7);
        assert_abs_diff_eq!(r1.maximum, 10., epsilon = 1e-6);
        assert!(!range.is_unique(1e-6));
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn single_pathway_is_unique() {
        let model = single_pathway();
        let range = flux_variability_analysis(
            &model,
            &model.reaction_bounds(),
            OPTIMUM_SLACK,
            Solver::Microlp,
        )
        .unwrap();
        assert!(range.is_unique(1e-6));
        let ex_a = range.get("EX_A").unwrap();
        assert_abs_diff_eq!(ex_a.minimum, -10., epsilon = 1e-6);
    }

    #[test]
    fn parallel_pathways_clarabel() {
        let model = parallel_pathways();
        let range = flux_variability_analysis(
            &model,
            &model.reaction_bounds(),
            OPTIMUM_SLACK,
            Solver::Clarabel,
        )
        .unwrap();
        assert!(range.non_uniqueness() > 1.);
    }
}

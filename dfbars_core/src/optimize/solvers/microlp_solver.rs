//! Implements a solver interface for microlp
//!
//! microlp is a simplex solver, so optimal solutions are always basic (vertex)
//! solutions. That makes it the preferred back-end when comparing flux ranges.

use microlp::{ComparisonOp, LinearExpr, OptimizationDirection};

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{LinearSolver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Simplex solver backed by microlp
#[derive(Clone, Copy, Debug, Default)]
pub struct MicrolpSolver;

impl MicrolpSolver {
    fn expression(terms: &[ConstraintTerm], variables: &[microlp::Variable]) -> LinearExpr {
        let mut expr = LinearExpr::empty();
        for term in terms {
            expr.add(variables[term.variable], term.coefficient);
        }
        expr
    }
}

impl LinearSolver for MicrolpSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut lp = microlp::Problem::new(direction);
        let coefficients = problem
            .objective()
            .dense_coefficients(problem.num_variables());
        let variables: Vec<microlp::Variable> = problem
            .variables()
            .map(|var| {
                lp.add_var(
                    coefficients[var.index()],
                    (var.lower_bound(), var.upper_bound()),
                )
            })
            .collect();

        for constraint in problem.constraints() {
            match constraint {
                Constraint::Equality { terms, equals } => {
                    lp.add_constraint(Self::expression(terms, &variables), ComparisonOp::Eq, *equals);
                }
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                } => {
                    if lower_bound.is_finite() {
                        lp.add_constraint(
                            Self::expression(terms, &variables),
                            ComparisonOp::Ge,
                            *lower_bound,
                        );
                    }
                    if upper_bound.is_finite() {
                        lp.add_constraint(
                            Self::expression(terms, &variables),
                            ComparisonOp::Le,
                            *upper_bound,
                        );
                    }
                }
            }
        }

        match lp.solve() {
            Ok(solution) => {
                let values: Vec<f64> = variables.iter().map(|v| solution[*v]).collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(problem.objective().evaluate(&values)),
                    variable_values: Some(values),
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Unbounded))
            }
            #[allow(unreachable_patterns)]
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_simple() {
        // max x + y s.t. x + 2y <= 4, 0 <= x <= 3, y >= 0
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        let x = problem.add_new_variable("x", 0., 3.).unwrap();
        let y = problem.add_new_variable("y", 0., f64::INFINITY).unwrap();
        problem
            .add_new_inequality_constraint("c", &[x, y], &[1., 2.], f64::NEG_INFINITY, 4.)
            .unwrap();
        problem.add_new_linear_objective_term(x, 1.).unwrap();
        problem.add_new_linear_objective_term(y, 1.).unwrap();

        let solution = MicrolpSolver.solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 3.5).abs() < 1e-9);
        let values = solution.variable_values.unwrap();
        assert!((values[x] - 3.).abs() < 1e-9);
        assert!((values[y] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn infeasible() {
        let mut problem = Problem::new(ObjectiveSense::Minimize);
        let x = problem.add_new_variable("x", 0., 1.).unwrap();
        problem
            .add_new_equality_constraint("c", &[x], &[1.], 2.)
            .unwrap();
        let solution = MicrolpSolver.solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(!solution.is_optimal());
    }

    #[test]
    fn unbounded() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        let x = problem.add_new_variable("x", 0., f64::INFINITY).unwrap();
        problem
            .add_new_inequality_constraint("c", &[x], &[1.], 1., f64::INFINITY)
            .unwrap();
        problem.add_new_linear_objective_term(x, 1.).unwrap();
        let solution = MicrolpSolver.solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Unbounded);
    }
}

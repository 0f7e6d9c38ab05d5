//! Solver back-ends for linear optimization problems
pub mod clarabel_solver;
#[cfg(feature = "minilp")]
pub mod microlp_solver;

use crate::configuration::Solver;
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;
use thiserror::Error;

/// A solver able to optimize a linear [`Problem`] with continuous variables
pub trait LinearSolver {
    /// Solve the problem
    ///
    /// Infeasible or unbounded problems are not errors, they are reported through the
    /// [`ProblemSolution::status`]. Errors are reserved for problems the back-end could not
    /// process at all.
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        fn solve_simplex(problem: &Problem) -> Result<ProblemSolution, SolverError> {
            microlp_solver::MicrolpSolver.solve(problem)
        }
    } else {
        fn solve_simplex(_problem: &Problem) -> Result<ProblemSolution, SolverError> {
            Err(SolverError::Unavailable("microlp (enable the minilp feature)"))
        }
    }
}

/// Solve a problem with the requested back-end
pub fn solve(problem: &Problem, solver: Solver) -> Result<ProblemSolution, SolverError> {
    match solver {
        Solver::Clarabel => clarabel_solver::ClarabelSolver::default().solve(problem),
        Solver::Microlp => solve_simplex(problem),
    }
}

/// Errors raised by solver back-ends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The requested back-end was not compiled in
    #[error("Solver {0} is not available")]
    Unavailable(&'static str),
    /// The back-end failed for a reason other than infeasibility or unboundedness
    #[error("Solver back-end failed: {0}")]
    Backend(String),
    /// The problem could not be translated for the back-end
    #[error("Problem could not be translated for the solver: {0}")]
    InvalidProblem(String),
}

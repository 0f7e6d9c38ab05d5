//! Implements a solver interface for Clarabel
//!
//! Clarabel solves problems in the conic form
//! `min 1/2 x'Px + q'x  s.t.  Ax + s = b, s in K`, so variable bounds and two sided
//! inequality constraints are expanded into rows of `A` with either a zero cone (equalities)
//! or a nonnegative cone (inequalities).

use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, NonnegativeConeT, SolverStatus, SupportedConeT,
    ZeroConeT,
};
use nalgebra_sparse::CooMatrix;

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{LinearSolver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point solver backed by Clarabel
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    /// Maximum number of interior point iterations
    pub max_iter: u32,
    /// Print solver progress
    pub verbose: bool,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self {
            max_iter: 200,
            verbose: false,
        }
    }
}

/// Rows of the constraint matrix, split by the cone they belong to
#[derive(Default)]
struct ConicRows {
    equality: Vec<(Vec<(usize, f64)>, f64)>,
    inequality: Vec<(Vec<(usize, f64)>, f64)>,
}

impl ConicRows {
    /// Add `terms <= rhs`
    fn push_upper(&mut self, terms: &[ConstraintTerm], rhs: f64) {
        self.inequality.push((
            terms.iter().map(|t| (t.variable, t.coefficient)).collect(),
            rhs,
        ));
    }

    /// Add `terms >= rhs`, stored as `-terms <= -rhs`
    fn push_lower(&mut self, terms: &[ConstraintTerm], rhs: f64) {
        self.inequality.push((
            terms.iter().map(|t| (t.variable, -t.coefficient)).collect(),
            -rhs,
        ));
    }

    fn push_equal(&mut self, terms: &[ConstraintTerm], rhs: f64) {
        self.equality.push((
            terms.iter().map(|t| (t.variable, t.coefficient)).collect(),
            rhs,
        ));
    }

    fn from_problem(problem: &Problem) -> Self {
        let mut rows = ConicRows::default();
        for var in problem.variables() {
            let term = [ConstraintTerm {
                variable: var.index(),
                coefficient: 1.,
            }];
            if var.is_fixed() {
                rows.push_equal(&term, var.lower_bound());
                continue;
            }
            if var.upper_bound().is_finite() {
                rows.push_upper(&term, var.upper_bound());
            }
            if var.lower_bound().is_finite() {
                rows.push_lower(&term, var.lower_bound());
            }
        }
        for constraint in problem.constraints() {
            match constraint {
                Constraint::Equality { terms, equals } => rows.push_equal(terms, *equals),
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                } => {
                    if upper_bound.is_finite() {
                        rows.push_upper(terms, *upper_bound);
                    }
                    if lower_bound.is_finite() {
                        rows.push_lower(terms, *lower_bound);
                    }
                }
            }
        }
        rows
    }

    /// Assemble `A`, `b` and the cones
    fn assemble(self, num_variables: usize) -> (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>) {
        let num_equality = self.equality.len();
        let num_inequality = self.inequality.len();
        let mut coo = CooMatrix::new(num_equality + num_inequality, num_variables);
        let mut b = Vec::with_capacity(num_equality + num_inequality);
        for (row, (terms, rhs)) in self.equality.into_iter().chain(self.inequality).enumerate() {
            for (col, value) in terms {
                if value != 0. {
                    coo.push(row, col, value);
                }
            }
            b.push(rhs);
        }
        let csc = nalgebra_sparse::CscMatrix::from(&coo);
        let (nrows, ncols) = (csc.nrows(), csc.ncols());
        let (col_offsets, row_indices, values) = csc.disassemble();
        let a = CscMatrix::new(nrows, ncols, col_offsets, row_indices, values);

        let mut cones = Vec::new();
        if num_equality > 0 {
            cones.push(ZeroConeT(num_equality));
        }
        if num_inequality > 0 {
            cones.push(NonnegativeConeT(num_inequality));
        }
        (a, b, cones)
    }
}

fn status_from_clarabel(status: SolverStatus) -> OptimizationStatus {
    match status {
        SolverStatus::Solved => OptimizationStatus::Optimal,
        SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            OptimizationStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            OptimizationStatus::Unbounded
        }
        SolverStatus::NumericalError => OptimizationStatus::NumericalError,
        SolverStatus::Unsolved => OptimizationStatus::Unoptimized,
        #[allow(unreachable_patterns)]
        _ => OptimizationStatus::SolverHalted,
    }
}

impl LinearSolver for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        if n == 0 {
            return Err(SolverError::InvalidProblem(
                "problem has no variables".to_string(),
            ));
        }
        let sign = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };
        let q: Vec<f64> = problem
            .objective()
            .dense_coefficients(n)
            .into_iter()
            .map(|c| sign * c)
            .collect();
        let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let (a, b, cones) = ConicRows::from_problem(problem).assemble(n);

        let settings = DefaultSettings::<f64> {
            verbose: self.verbose,
            max_iter: self.max_iter,
            ..DefaultSettings::default()
        };
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = status_from_clarabel(solver.solution.status);
        match status {
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal => {
                let values = solver.solution.x.clone();
                Ok(ProblemSolution {
                    status,
                    objective_value: Some(problem.objective().evaluate(&values)),
                    variable_values: Some(values),
                })
            }
            _ => Ok(ProblemSolution::failed(status)),
        }
    }
}

//! Provides struct representing an optimization problem
use crate::configuration::Solver;
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::solvers::{self, SolverError};
use crate::optimize::variable::Variable;
use crate::optimize::ProblemSolution;
use indexmap::IndexMap;
use thiserror::Error;

/// A linear optimization problem
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem, keyed by id, in index order
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }
    // endregion Creation Functions

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }
    // endregion Accessors

    // region Adding Variables
    /// Create a new continuous variable and add it to the optimization problem
    ///
    /// Returns the index of the new variable.
    pub fn add_new_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, ProblemError> {
        if self.variables.contains_key(id) {
            return Err(ProblemError::VariableIdAlreadyExists(id.to_string()));
        }
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds(id.to_string()));
        }
        let index = self.variables.len();
        self.variables
            .insert(id.to_string(), Variable::new(id, index, lower_bound, upper_bound));
        Ok(index)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, id: &str, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(id, &constraint)?;
        self.constraints.insert(id.to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        variables: &[usize],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let new_cons = Constraint::new_equality(variables, coefficients, equals);
        self.add_constraint(id, new_cons)
    }

    /// Create a new inequality constraint and add it to the problem
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        variables: &[usize],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let new_cons =
            Constraint::new_inequality(variables, coefficients, lower_bound, upper_bound);
        self.add_constraint(id, new_cons)
    }
    // endregion Adding Constraints

    // region Objective
    /// Add a new linear term to the objective
    pub fn add_new_linear_objective_term(
        &mut self,
        variable: usize,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if variable >= self.variables.len() {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective.add_linear_term(variable, coefficient);
        Ok(())
    }

    /// Replace the objective entirely
    pub fn set_objective(&mut self, objective: Objective) -> Result<(), ProblemError> {
        if objective
            .terms()
            .iter()
            .any(|t| t.variable >= self.variables.len())
        {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective = objective;
        Ok(())
    }
    // endregion Objective

    /// Solve the problem with the requested solver
    pub fn solve(&self, solver: Solver) -> Result<ProblemSolution, SolverError> {
        solvers::solve(self, solver)
    }

    // region Validation Functions
    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, id: &str, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists(id.to_string()));
        }
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds(id.to_string()));
            }
        }
        if constraint
            .terms()
            .iter()
            .any(|t| t.variable >= self.variables.len())
        {
            return Err(ProblemError::NonExistentVariablesInConstraint(id.to_string()));
        }
        Ok(())
    }
    // endregion Validation Functions
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable: {0}")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to set lower_bound > upper_bound on variable {0}")]
    InvalidVariableBounds(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint: {0}")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add inequality constraint {0} with lower_bound > upper_bound")]
    InvalidConstraintBounds(String),
    /// Error when trying to add a constraint that contains variables not in the problem
    #[error("Constraint {0} references variables not in the problem")]
    NonExistentVariablesInConstraint(String),
    /// Error when trying to add an objective term which includes variables not in the problem
    #[error("Tried adding an objective term with variables not in the problem")]
    NonExistentVariablesInObjective,
}

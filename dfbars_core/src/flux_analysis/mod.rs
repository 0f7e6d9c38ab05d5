//! Steady state flux analyses on a metabolic [`Model`]
//!
//! Every analysis formulates the network as a linear program with one forward and one reverse
//! variable per reaction (both non-negative), mass balance equality constraints per metabolite
//! and the model objective on the net fluxes.

pub mod fba;
pub mod fva;
pub mod pfba;

use indexmap::IndexMap;
use thiserror::Error;

use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::FluxBounds;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::SolverError;
use crate::optimize::{OptimizationStatus, ProblemSolution};

pub use fba::fba;
pub use fva::{flux_variability_analysis, FluxRange, OptimalityRange};
pub use pfba::pfba;

/// Relative slack used when the primary objective is pinned at its optimum
pub const OPTIMUM_SLACK: f64 = 1e-9;

/// Optimized fluxes of every reaction
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FluxVector {
    /// Outcome of the optimization
    pub status: OptimizationStatus,
    /// Value of the primary objective, None when no optimum was found
    pub objective_value: Option<f64>,
    /// Net flux of every reaction, in model order. Empty when no optimum was found
    pub fluxes: IndexMap<String, f64>,
}

impl FluxVector {
    pub(crate) fn not_optimal(status: OptimizationStatus) -> Self {
        Self {
            status,
            objective_value: None,
            fluxes: IndexMap::new(),
        }
    }

    /// Whether the fluxes describe an optimum
    pub fn is_optimal(&self) -> bool {
        matches!(
            self.status,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        )
    }

    pub fn flux(&self, reaction_id: &str) -> Option<f64> {
        self.fluxes.get(reaction_id).copied()
    }
}

/// The linear program of a metabolic network under a set of flux bounds
#[derive(Debug, Clone)]
pub(crate) struct FluxProblem {
    problem: Problem,
    reaction_ids: Vec<String>,
    forward: Vec<usize>,
    reverse: Vec<usize>,
    /// (reaction position, objective coefficient)
    objective: Vec<(usize, f64)>,
}

impl FluxProblem {
    /// Build the problem, `bounds` must be ordered like the model reactions
    pub(crate) fn new(model: &Model, bounds: &[FluxBounds]) -> Result<Self, FluxAnalysisError> {
        model.validate()?;
        if bounds.len() != model.reactions.len() {
            return Err(ModelError::BoundsLength {
                expected: model.reactions.len(),
                got: bounds.len(),
            }
            .into());
        }
        let mut problem = Problem::new(model.objective_sense);
        let mut forward = Vec::with_capacity(bounds.len());
        let mut reverse = Vec::with_capacity(bounds.len());
        for (reaction, bound) in model.reactions.values().zip(bounds) {
            if !bound.is_valid() {
                return Err(ModelError::InvalidBounds(reaction.id.clone()).into());
            }
            let (f_lb, f_ub) = bound.forward();
            let (r_lb, r_ub) = bound.reverse();
            forward.push(problem.add_new_variable(&reaction.get_forward_id(), f_lb, f_ub)?);
            reverse.push(problem.add_new_variable(&reaction.get_reverse_id(), r_lb, r_ub)?);
        }

        // Mass balance, S v = 0
        let mut balances: IndexMap<&str, (Vec<usize>, Vec<f64>)> = model
            .metabolites
            .keys()
            .map(|m| (m.as_str(), (Vec::new(), Vec::new())))
            .collect();
        for (pos, reaction) in model.reactions.values().enumerate() {
            for (met, coef) in &reaction.metabolites {
                if let Some((vars, coefs)) = balances.get_mut(met.as_str()) {
                    vars.push(forward[pos]);
                    coefs.push(*coef);
                    vars.push(reverse[pos]);
                    coefs.push(-*coef);
                }
            }
        }
        for (metabolite, (vars, coefs)) in model.metabolites.values().zip(balances.into_values()) {
            if !vars.is_empty() {
                problem.add_new_equality_constraint(&metabolite.balance_id(), &vars, &coefs, 0.)?;
            }
        }

        let objective: Vec<(usize, f64)> = model
            .objective
            .iter()
            .filter_map(|(rxn, coef)| model.reactions.get_index_of(rxn).map(|pos| (pos, *coef)))
            .collect();
        for (pos, coef) in &objective {
            problem.add_new_linear_objective_term(forward[*pos], *coef)?;
            problem.add_new_linear_objective_term(reverse[*pos], -*coef)?;
        }

        Ok(Self {
            problem,
            reaction_ids: model.reactions.keys().cloned().collect(),
            forward,
            reverse,
            objective,
        })
    }

    pub(crate) fn problem(&self) -> &Problem {
        &self.problem
    }

    pub(crate) fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    pub(crate) fn num_reactions(&self) -> usize {
        self.reaction_ids.len()
    }

    /// Variables and coefficients of the net flux of a reaction
    pub(crate) fn net_flux_terms(&self, reaction: usize) -> ([usize; 2], [f64; 2]) {
        ([self.forward[reaction], self.reverse[reaction]], [1., -1.])
    }

    /// Variables and coefficients of the primary objective
    fn primary_terms(&self) -> (Vec<usize>, Vec<f64>) {
        let mut vars = Vec::with_capacity(self.objective.len() * 2);
        let mut coefs = Vec::with_capacity(self.objective.len() * 2);
        for (pos, coef) in &self.objective {
            vars.push(self.forward[*pos]);
            coefs.push(*coef);
            vars.push(self.reverse[*pos]);
            coefs.push(-*coef);
        }
        (vars, coefs)
    }

    /// Constrain the primary objective to stay at its optimum (within a relative slack)
    pub(crate) fn fix_primary_objective(
        &mut self,
        optimum: f64,
        slack: f64,
    ) -> Result<(), FluxAnalysisError> {
        let (vars, coefs) = self.primary_terms();
        let delta = slack * optimum.abs().max(1.);
        let (lower, upper) = match self.problem.objective().sense() {
            ObjectiveSense::Maximize => (optimum - delta, f64::INFINITY),
            ObjectiveSense::Minimize => (f64::NEG_INFINITY, optimum + delta),
        };
        self.problem
            .add_new_inequality_constraint("fixed_primary_objective", &vars, &coefs, lower, upper)?;
        Ok(())
    }

    /// Turn a solver solution into net fluxes, with the primary objective evaluated on them
    pub(crate) fn flux_vector(&self, solution: &ProblemSolution) -> FluxVector {
        match &solution.variable_values {
            Some(values) if solution.is_optimal() => {
                let fluxes: IndexMap<String, f64> = self
                    .reaction_ids
                    .iter()
                    .enumerate()
                    .map(|(pos, id)| {
                        (id.clone(), values[self.forward[pos]] - values[self.reverse[pos]])
                    })
                    .collect();
                let objective_value = self
                    .objective
                    .iter()
                    .map(|(pos, coef)| coef * fluxes[*pos])
                    .sum();
                FluxVector {
                    status: solution.status,
                    objective_value: Some(objective_value),
                    fluxes,
                }
            }
            _ => FluxVector::not_optimal(solution.status),
        }
    }

    pub(crate) fn reaction_ids(&self) -> &[String] {
        &self.reaction_ids
    }

    pub(crate) fn split_variables(&self) -> impl Iterator<Item = usize> + '_ {
        self.forward.iter().chain(self.reverse.iter()).copied()
    }
}

/// Errors raised by flux analyses
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluxAnalysisError {
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid optimization problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("Solver failure: {0}")]
    Solver(#[from] SolverError),
    #[error("No optimum found, solver status {0:?}")]
    NotOptimal(OptimizationStatus),
}

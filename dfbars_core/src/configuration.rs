//! Process-wide defaults for models and solvers
use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Default values used when building reactions and solving problems
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Default lower flux bound for newly built reactions
    pub lower_bound: f64,
    /// Default upper flux bound for newly built reactions
    pub upper_bound: f64,
    /// Linear program solver used when none is requested explicitly
    pub solver: Solver,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            solver: Solver::default(),
        }
    }
}

/// Take a snapshot of the current configuration
///
/// A poisoned lock still holds valid plain data, so the poison flag is ignored rather than
/// propagated.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the default solver used for new optimizations
pub fn set_default_solver(solver: Solver) {
    match CONFIGURATION.write() {
        Ok(mut guard) => guard.solver = solver,
        Err(poisoned) => poisoned.into_inner().solver = solver,
    }
}

/// Enum used to specify the default solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Solver {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the microlp simplex solver, requires the minilp feature to be enabled
    Microlp,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        const DEFAULT_SOLVER: Solver = Solver::Microlp;
    } else {
        const DEFAULT_SOLVER: Solver = Solver::Clarabel;
    }
}

impl Solver {
    /// Smallest relative slack the back-end honors when an optimum is pinned as a constraint
    ///
    /// Interior point solutions are only feasible up to the solver tolerance, so the objective
    /// they report can sit slightly above the true optimum.
    pub fn precision(&self) -> f64 {
        match self {
            Solver::Clarabel => 1e-7,
            Solver::Microlp => 1e-9,
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        DEFAULT_SOLVER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds() {
        let config = Configuration::default();
        assert!((config.lower_bound + 1000.).abs() < 1e-25);
        assert!((config.upper_bound - 1000.).abs() < 1e-25);
    }

    #[test]
    fn set_solver() {
        // Other tests read the global default, keep it unchanged
        set_default_solver(Solver::default());
        assert_eq!(current().solver, Solver::default());
    }

    #[test]
    fn simplex_pins_tighter() {
        assert!(Solver::Microlp.precision() < Solver::Clarabel.precision());
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn simplex_is_default_when_available() {
        assert_eq!(Solver::default(), Solver::Microlp);
    }
}

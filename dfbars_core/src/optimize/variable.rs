//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

/// A continuous variable of a linear program
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Identifier, unique within a problem
    pub(crate) id: String,
    /// Position of the variable in the problem, used by the solver back-ends
    pub(crate) index: usize,
    /// Lowest value the variable can take, may be `f64::NEG_INFINITY`
    pub(crate) lower_bound: f64,
    /// Highest value the variable can take, may be `f64::INFINITY`
    pub(crate) upper_bound: f64,
}

impl Variable {
    /// Create a new variable
    pub(crate) fn new(id: &str, index: usize, lower_bound: f64, upper_bound: f64) -> Variable {
        Variable {
            id: id.to_string(),
            index,
            lower_bound,
            upper_bound,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Whether the variable is pinned to a single value
    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound)
    }
}

//! Provides struct for representing an optimization problem's objective

/// Represents the linear objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Add a new linear term to the objective
    pub fn add_linear_term(&mut self, variable: usize, coefficient: f64) {
        self.terms.push(ObjectiveTerm {
            variable,
            coefficient,
        });
    }

    /// Add a series of linear terms to the objective function
    pub fn add_linear_terms(&mut self, variables: &[usize], coefficients: &[f64]) {
        self.terms.extend(
            variables
                .iter()
                .zip(coefficients)
                .map(|(variable, coefficient)| ObjectiveTerm {
                    variable: *variable,
                    coefficient: *coefficient,
                }),
        );
    }

    /// Evaluate the objective at the given variable values
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient * values[t.variable])
            .sum()
    }

    /// Coefficients of the objective as a dense vector of length `num_variables`
    ///
    /// Repeated terms on the same variable are summed.
    pub fn dense_coefficients(&self, num_variables: usize) -> Vec<f64> {
        let mut coefficients = vec![0.; num_variables];
        for term in &self.terms {
            coefficients[term.variable] += term.coefficient;
        }
        coefficients
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A linear term in the objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTerm {
    /// Index of the variable in the problem
    pub variable: usize,
    /// Coefficient for linear term
    pub coefficient: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_coefficients_sum_duplicates() {
        let mut objective = Objective::new(ObjectiveSense::Maximize);
        objective.add_linear_terms(&[0, 2, 0], &[1., 3., 2.]);
        assert_eq!(objective.dense_coefficients(3), vec![3., 0., 3.]);
    }

    #[test]
    fn evaluate() {
        let mut objective = Objective::new(ObjectiveSense::Minimize);
        objective.add_linear_term(0, 2.);
        objective.add_linear_term(1, -1.);
        assert!((objective.evaluate(&[3., 4.]) - 2.).abs() < 1e-12);
        assert_eq!(objective.sense(), ObjectiveSense::Minimize);
    }
}

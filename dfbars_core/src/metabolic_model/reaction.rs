//! This module provides a struct for representing reactions
use crate::configuration;
use crate::utils::hashing::hash_as_hex_string;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    #[builder(setter(into))]
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Lower flux bound
    #[builder(default = "configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl ReactionBuilder {
    /// Add a single metabolite with its stoichiometric coefficient
    pub fn metabolite(&mut self, id: &str, coefficient: f64) -> &mut Self {
        self.metabolites
            .get_or_insert_with(IndexMap::new)
            .insert(id.to_string(), coefficient);
        self
    }
}

impl Reaction {
    /// Determine the id to be associated with the forward reaction in the optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id to be associated with the reverse reaction in the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// The bounds declared on the reaction
    pub fn bounds(&self) -> FluxBounds {
        FluxBounds::new(self.lower_bound, self.upper_bound)
    }

    /// An exchange (boundary) reaction has exactly one metabolite
    pub fn is_exchange(&self) -> bool {
        self.metabolites.len() == 1
    }
}

/// Lower and upper bound of a single flux
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FluxBounds {
    pub lower: f64,
    pub upper: f64,
}

impl FluxBounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn is_valid(&self) -> bool {
        self.lower <= self.upper
    }

    /// Bounds of the variable carrying the forward part of the flux
    pub(crate) fn forward(&self) -> (f64, f64) {
        (self.lower.max(0.), self.upper.max(0.))
    }

    /// Bounds of the variable carrying the reverse part of the flux
    pub(crate) fn reverse(&self) -> (f64, f64) {
        ((-self.upper).max(0.), (-self.lower).max(0.))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let reaction = ReactionBuilder::default()
            .id("R1")
            .metabolite("A", -1.)
            .metabolite("B", 1.)
            .build()
            .unwrap();
        assert!((reaction.lower_bound + 1000.).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.).abs() < 1e-25);
        assert_eq!(reaction.metabolites.len(), 2);
        assert!(!reaction.is_exchange());
    }

    #[test]
    fn ids() {
        let reaction = ReactionBuilder::default().id("R1").build().unwrap();
        assert_eq!(reaction.get_forward_id(), "R1_forward");
        assert!(reaction.get_reverse_id().starts_with("R1_reverse_"));
        assert_ne!(reaction.get_reverse_id(), reaction.get_forward_id());
    }

    #[test]
    fn split_bounds() {
        // Reversible
        let bounds = FluxBounds::new(-5., 10.);
        assert_eq!(bounds.forward(), (0., 10.));
        assert_eq!(bounds.reverse(), (0., 5.));
        // Forced forward flux
        let bounds = FluxBounds::new(2., 10.);
        assert_eq!(bounds.forward(), (2., 10.));
        assert_eq!(bounds.reverse(), (0., 0.));
        // Forced uptake
        let bounds = FluxBounds::new(-10., -2.);
        assert_eq!(bounds.forward(), (0., 0.));
        assert_eq!(bounds.reverse(), (2., 10.));
    }
}

//! Metabolites balanced by the steady state network
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A metabolite, every metabolite of a model gets a mass balance constraint
///
/// Only `id` takes part in the flux problem, the other fields are carried for model exchange.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Unique within a model
    #[builder(setter(into))]
    pub id: String,
    #[builder(default)]
    pub name: Option<String>,
    #[builder(default)]
    pub compartment: Option<String>,
    #[builder(default)]
    pub charge: i32,
    #[builder(default)]
    pub formula: Option<String>,
    /// Free form notes, kept as JSON text
    #[builder(default)]
    pub notes: Option<String>,
    /// Annotations, kept as JSON text
    #[builder(default)]
    pub annotation: Option<String>,
}

impl Metabolite {
    /// A metabolite known only by its id
    pub fn with_id(id: &str) -> Self {
        Metabolite {
            id: id.to_string(),
            name: None,
            compartment: None,
            charge: 0,
            formula: None,
            notes: None,
            annotation: None,
        }
    }

    /// Id of the mass balance constraint of this metabolite
    pub(crate) fn balance_id(&self) -> String {
        format!("balance_{}", self.id)
    }
}

impl Display for Metabolite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.name, &self.compartment) {
            (Some(name), Some(c)) => write!(f, "{} ({}) [{}]", self.id, name, c),
            (Some(name), None) => write!(f, "{} ({})", self.id, name),
            (None, Some(c)) => write!(f, "{} [{}]", self.id, c),
            (None, None) => write!(f, "{}", self.id),
        }
    }
}

//! This module provides the Model struct for representing an entire metabolic network
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{FluxBounds, Reaction};
use crate::optimize::objective::ObjectiveSense;

use indexmap::IndexMap;
use thiserror::Error;

/// Represents a steady state metabolic network
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Whether the objective is maximized or minimized
    pub objective_sense: ObjectiveSense,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            objective_sense: ObjectiveSense::Maximize,
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// Metabolites referenced by the reaction which are not yet part of the model are added
    /// with only their id set.
    ///
    /// # Examples
    /// ```rust
    /// use dfbars_core::metabolic_model::model::Model;
    /// use dfbars_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default()
    ///     .id("new_reaction")
    ///     .metabolite("A", -1.)
    ///     .build()
    ///     .unwrap();
    /// model.add_reaction(new_reaction);
    /// assert!(model.metabolites.contains_key("A"));
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for met in reaction.metabolites.keys() {
            if !self.metabolites.contains_key(met) {
                self.metabolites
                    .insert(met.clone(), Metabolite::with_id(met));
            }
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Set the objective coefficient of a reaction
    pub fn set_objective_coefficient(
        &mut self,
        reaction_id: &str,
        coefficient: f64,
    ) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::UnknownReaction(reaction_id.to_string()));
        }
        self.objective.insert(reaction_id.to_string(), coefficient);
        Ok(())
    }

    /// Ids of the exchange reactions, in model order
    pub fn exchanges(&self) -> Vec<&str> {
        self.reactions
            .values()
            .filter(|r| r.is_exchange())
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Declared bounds of every reaction, in model order
    pub fn reaction_bounds(&self) -> Vec<FluxBounds> {
        self.reactions.values().map(|r| r.bounds()).collect()
    }

    /// Check the internal consistency of the model
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.reactions.is_empty() {
            return Err(ModelError::Empty);
        }
        for reaction in self.reactions.values() {
            if !reaction.bounds().is_valid() {
                return Err(ModelError::InvalidBounds(reaction.id.clone()));
            }
            if let Some(met) = reaction
                .metabolites
                .keys()
                .find(|m| !self.metabolites.contains_key(*m))
            {
                return Err(ModelError::UnknownMetabolite(met.clone()));
            }
        }
        if let Some(rxn) = self
            .objective
            .keys()
            .find(|r| !self.reactions.contains_key(*r))
        {
            return Err(ModelError::UnknownReaction(rxn.clone()));
        }
        Ok(())
    }
}

/// Errors describing an inconsistent metabolic model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("The model has no reactions")]
    Empty,
    #[error("Reaction {0} is not part of the model")]
    UnknownReaction(String),
    #[error("Metabolite {0} is not part of the model")]
    UnknownMetabolite(String),
    #[error("Reaction {0} has lower_bound > upper_bound")]
    InvalidBounds(String),
    #[error("Expected {expected} bounds, got {got}")]
    BoundsLength { expected: usize, got: usize },
}

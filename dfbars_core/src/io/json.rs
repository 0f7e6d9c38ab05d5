//! Module providing COBRA JSON IO for metabolic Models
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};
use crate::optimize::objective::ObjectiveSense;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
///
/// Gene entries and gene reaction rules of COBRA files are accepted and ignored.
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    compartment: Option<String>,
    #[serde(default)]
    charge: Option<i32>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default)]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/// Notes and annotations are kept as JSON text on the model
fn to_value(text: &Option<String>) -> Option<Value> {
    text.as_ref()
        .map(|t| serde_json::from_str(t).unwrap_or_else(|_| Value::String(t.clone())))
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes.map(|v| v.to_string()),
            annotation: m.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: Some(m.charge),
            formula: m.formula.clone(),
            notes: to_value(&m.notes),
            annotation: to_value(&m.annotation),
        }
    }
}

impl Model {
    /// Read a COBRA JSON model from a file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = fs::read_to_string(path)?;
        Model::from_json_str(&model_str)
    }

    /// Parse a COBRA JSON model
    ///
    /// # Examples
    /// ```rust
    /// use dfbars_core::metabolic_model::model::Model;
    /// let data = r#"{
    ///     "metabolites": [{"id": "A"}],
    ///     "reactions": [
    ///         {"id": "EX_A", "metabolites": {"A": -1.0}, "lower_bound": -10.0,
    ///          "upper_bound": 0.0, "objective_coefficient": 1.0}
    ///     ]
    /// }"#;
    /// let model = Model::from_json_str(data).unwrap();
    /// assert_eq!(model.exchanges(), vec!["EX_A"]);
    /// ```
    pub fn from_json_str(data: &str) -> Result<Model, JsonError> {
        let json_model: JsonModel = serde_json::from_str(data)?;
        let model = Model::from_json(json_model)?;
        model.validate()?;
        Ok(model)
    }

    /// Write the model as COBRA JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        for met in json_model.metabolites {
            model.add_metabolite(met.into());
        }
        for rxn in json_model.reactions {
            let reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(rxn.notes.map(|v| v.to_string()))
                .annotation(rxn.annotation.map(|v| v.to_string()))
                .build()?;
            if model.reactions.contains_key(&reaction.id) {
                return Err(JsonError::DuplicateReaction(reaction.id));
            }
            model.add_reaction(reaction);
            match rxn.objective_coefficient {
                Some(coef) if coef != 0. => {
                    model.objective.insert(rxn.id, coef);
                }
                _ => {}
            }
        }
        model.objective_sense = ObjectiveSense::Maximize;
        model.id = json_model.id;
        model.compartments = json_model.compartments;
        model.version = json_model.version;
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let metabolites = self.metabolites.values().map(JsonMetabolite::from).collect();
        let reactions = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: to_value(&r.notes),
                annotation: to_value(&r.annotation),
            })
            .collect();
        JsonModel {
            metabolites,
            reactions,
            id: self.id.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read or write model file")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Reaction {0} is declared more than once")]
    DuplicateReaction(String),
    #[error("Invalid model")]
    InvalidModel(#[from] ModelError),
}
// endregion Conversions

//! Hands the optimized fluxes to the continuous model
use crate::dfba::collaborators::{ContinuousModel, ParameterIdx, ReactionIdx};
use crate::dfba::error::ConfigurationError;
use crate::flux_analysis::FluxVector;

/// Fixed pairs of (reaction, parameter) resolved once at construction
#[derive(Debug, Clone, PartialEq)]
pub struct FluxInjector {
    pairs: Vec<(ReactionIdx, ParameterIdx)>,
}

impl FluxInjector {
    pub fn new(
        reaction_ids: &[String],
        parameter_ids: &[String],
        mapping: &[(String, String)],
    ) -> Result<Self, ConfigurationError> {
        let pairs = mapping
            .iter()
            .map(|(reaction, parameter)| {
                Ok((
                    ReactionIdx::resolve(reaction_ids, reaction)?,
                    ParameterIdx::resolve(parameter_ids, parameter)?,
                ))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        Ok(Self { pairs })
    }

    /// Write the flux of every mapped reaction into its parameter
    pub fn inject<C: ContinuousModel + ?Sized>(&self, fluxes: &FluxVector, model: &mut C) {
        for (reaction, parameter) in &self.pairs {
            if let Some((_, value)) = fluxes.fluxes.get_index(reaction.index()) {
                model.set_parameter(*parameter, *value);
            }
        }
    }
}

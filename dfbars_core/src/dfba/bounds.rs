//! Translation of the current pools into exchange flux bounds
//!
//! The lower bound of an exchange reaction is the larger of its kinetic limit and the uptake
//! which would empty the pool within one step, `-P / (X * k * dt)`.

use serde::{Deserialize, Serialize};

use crate::dfba::collaborators::{OptimizationModel, ReactionIdx, SpeciesIdx};
use crate::dfba::error::ConfigurationError;
use crate::metabolic_model::reaction::FluxBounds;

/// Kinetic limit on the uptake through an exchange reaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KineticLimit {
    /// The lower bound the reaction was declared with
    Declared,
    /// A constant lower bound
    Fixed(f64),
    /// Saturating uptake, `-vmax * P / (km + P)`
    MichaelisMenten { vmax: f64, km: f64 },
}

impl KineticLimit {
    /// Lower bound implied by the limit for a pool of size `pool`
    pub fn lower_bound(&self, declared: &FluxBounds, pool: f64) -> f64 {
        match self {
            KineticLimit::Declared => declared.lower,
            KineticLimit::Fixed(limit) => *limit,
            KineticLimit::MichaelisMenten { vmax, km } => {
                let pool = pool.max(0.);
                if pool == 0. {
                    0.
                } else {
                    -vmax * pool / (km + pool)
                }
            }
        }
    }
}

/// Declared correspondence between an exchange reaction and the pool it exchanges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBinding {
    pub reaction: String,
    pub species: String,
    pub kinetic: KineticLimit,
}

impl ExchangeBinding {
    pub fn new(reaction: &str, species: &str, kinetic: KineticLimit) -> Self {
        Self {
            reaction: reaction.to_string(),
            species: species.to_string(),
            kinetic,
        }
    }
}

/// New bounds of one reaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundUpdate {
    pub reaction: ReactionIdx,
    pub bounds: FluxBounds,
}

#[derive(Debug, Clone)]
struct ResolvedExchange {
    id: String,
    reaction: ReactionIdx,
    species: SpeciesIdx,
    kinetic: KineticLimit,
    declared: FluxBounds,
}

/// Most negative uptake bound compatible with the limit and with keeping the pool non-negative
///
/// `max(limit, -pool / (biomass * conversion * dt))`
pub fn uptake_lower_bound(limit: f64, pool: f64, biomass: f64, conversion: f64, dt: f64) -> f64 {
    limit.max(-pool.max(0.) / (biomass * conversion * dt))
}

/// Replace values within `abs_tol` of zero by exactly zero
pub fn snap_to_zero(value: f64, abs_tol: f64) -> f64 {
    if value.abs() <= abs_tol {
        0.
    } else {
        value
    }
}

/// Computes the exchange bounds of every step from the current pools
#[derive(Debug, Clone)]
pub struct BoundsTranslator {
    exchanges: Vec<ResolvedExchange>,
    biomass: SpeciesIdx,
    conversion: f64,
}

impl BoundsTranslator {
    /// Resolve the bindings against both collaborators
    ///
    /// Every exchange reaction of the optimization model needs exactly one binding. `conversion`
    /// is the factor `k` turning biomass specific fluxes into pool rates (volume, units).
    pub fn new<O: OptimizationModel + ?Sized>(
        optimization: &O,
        variable_ids: &[String],
        biomass: &str,
        conversion: f64,
        bindings: &[ExchangeBinding],
    ) -> Result<Self, ConfigurationError> {
        if !(conversion.is_finite() && conversion > 0.) {
            return Err(ConfigurationError::InvalidConversionFactor(conversion));
        }
        let reaction_ids = optimization.reaction_ids();
        let biomass = SpeciesIdx::resolve(variable_ids, biomass)?;
        let mut exchanges: Vec<ResolvedExchange> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let reaction = ReactionIdx::resolve(&reaction_ids, &binding.reaction)?;
            if exchanges.iter().any(|e| e.reaction == reaction) {
                return Err(ConfigurationError::DuplicateMapping(binding.reaction.clone()));
            }
            exchanges.push(ResolvedExchange {
                id: binding.reaction.clone(),
                reaction,
                species: SpeciesIdx::resolve(variable_ids, &binding.species)?,
                kinetic: binding.kinetic,
                declared: optimization.default_bounds(reaction),
            });
        }
        if let Some(unmapped) = optimization
            .exchange_reaction_ids()
            .into_iter()
            .find(|id| !exchanges.iter().any(|e| &e.id == id))
        {
            return Err(ConfigurationError::UnmappedExchange(unmapped));
        }
        Ok(Self {
            exchanges,
            biomass,
            conversion,
        })
    }

    /// Ids of the bound reactions, in the order of [`BoundsTranslator::translate`]
    pub fn reaction_ids(&self) -> Vec<String> {
        self.exchanges.iter().map(|e| e.id.clone()).collect()
    }

    /// Bounds of every bound reaction for the pools in `state`
    pub fn translate(&self, state: &[f64], dt: f64, abs_tol: f64) -> Vec<BoundUpdate> {
        let biomass = state[self.biomass.index()];
        let guard_pools = biomass > abs_tol;
        if !guard_pools {
            tracing::debug!(
                biomass,
                "Biomass at or below tolerance, pool depletion limits skipped"
            );
        }
        self.exchanges
            .iter()
            .map(|exchange| {
                let pool = state[exchange.species.index()];
                let limit = exchange.kinetic.lower_bound(&exchange.declared, pool);
                let lower = if guard_pools {
                    uptake_lower_bound(limit, pool, biomass, self.conversion, dt)
                } else {
                    limit
                };
                let mut bounds = FluxBounds::new(
                    self.snap(&exchange.id, "lower", lower, abs_tol),
                    self.snap(&exchange.id, "upper", exchange.declared.upper, abs_tol),
                );
                if bounds.lower > bounds.upper {
                    tracing::warn!(
                        reaction = exchange.id.as_str(),
                        lower = bounds.lower,
                        upper = bounds.upper,
                        "Lower bound exceeds upper bound, raising upper bound"
                    );
                    bounds.upper = bounds.lower;
                }
                BoundUpdate {
                    reaction: exchange.reaction,
                    bounds,
                }
            })
            .collect()
    }

    fn snap(&self, reaction: &str, side: &str, value: f64, abs_tol: f64) -> f64 {
        let snapped = snap_to_zero(value, abs_tol);
        if snapped.to_bits() != value.to_bits() {
            tracing::info!(reaction, side, value, "Snapped bound to zero");
        }
        snapped
    }
}

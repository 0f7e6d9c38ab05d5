//! Well mixed bioreactor, the continuous model of a dynamic flux balance simulation
//!
//! Species pools change through two kinds of terms:
//! - flux updates, `d[S]/dt += coefficient * v * X0`, where the flux `v` is a parameter written by
//!   the coupler every step and `X0` the biomass pool at the start of the integrated interval
//! - kinetic rates, arbitrary functions of the species and parameter values, e.g. gas transfer
//!
//! Holding the biomass at its interval start value makes the uptake over one interval exactly
//! `v * X0 * dt`, the amount the exchange bounds are computed from.
//!
//! Every flux update owns a flux tracking column reporting its current rate.

use indexmap::IndexMap;
use ode_solvers::System;
use thiserror::Error;

use crate::dfba::collaborators::{ContinuousModel, IntervalSnapshots, ParameterIdx, StateSnapshot};
use crate::ode::integrator::{DormandPrince, IntegrationError, Integrator, State};

/// Rate of a kinetic term, from the species values and the parameter values
pub type RateFn = Box<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

struct FluxUpdate {
    species: usize,
    biomass: usize,
    flux_parameter: usize,
    coefficient: f64,
}

struct KineticTerm {
    species: usize,
    rate: RateFn,
}

/// Species pools of a bioreactor driven by exchange fluxes
pub struct BioreactorModel<I: Integrator = DormandPrince> {
    /// Initial value of every species
    species: IndexMap<String, f64>,
    /// Initial value of every parameter
    parameters: IndexMap<String, f64>,
    /// Flux updates keyed by the id of their tracking column
    updates: IndexMap<String, FluxUpdate>,
    kinetics: Vec<KineticTerm>,
    non_negative: bool,
    /// Negative values beyond this are reported when clamped
    absolute_tolerance: f64,
    integrator: I,
    time: f64,
    state: State,
    parameter_values: Vec<f64>,
    /// Biomass of every flux update at the start of the current interval
    interval_biomass: Vec<f64>,
}

impl Default for BioreactorModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BioreactorModel {
    /// An empty reactor integrated with [`DormandPrince`]
    pub fn new() -> Self {
        Self::with_integrator(DormandPrince::default())
    }
}

impl<I: Integrator> BioreactorModel<I> {
    pub fn with_integrator(integrator: I) -> Self {
        Self {
            species: IndexMap::new(),
            parameters: IndexMap::new(),
            updates: IndexMap::new(),
            kinetics: Vec::new(),
            non_negative: true,
            absolute_tolerance: 1e-6,
            integrator,
            time: 0.,
            state: State::zeros(0),
            parameter_values: Vec::new(),
            interval_biomass: Vec::new(),
        }
    }

    // region Building
    /// Add a species pool, returns its index
    pub fn add_species(&mut self, id: &str, initial_value: f64) -> Result<usize, BioreactorError> {
        if self.species.contains_key(id) {
            return Err(BioreactorError::DuplicateSpecies(id.to_string()));
        }
        if !initial_value.is_finite() {
            return Err(BioreactorError::InvalidValue(id.to_string()));
        }
        self.species.insert(id.to_string(), initial_value);
        self.state = State::from_iterator(self.species.len(), self.species.values().copied());
        Ok(self.species.len() - 1)
    }

    /// Add a parameter, returns its index
    pub fn add_parameter(&mut self, id: &str, value: f64) -> Result<usize, BioreactorError> {
        if self.parameters.contains_key(id) {
            return Err(BioreactorError::DuplicateParameter(id.to_string()));
        }
        self.parameters.insert(id.to_string(), value);
        self.parameter_values.push(value);
        Ok(self.parameters.len() - 1)
    }

    /// Couple a species pool to a flux
    ///
    /// Adds the term `d[species]/dt += coefficient * flux_parameter * biomass`, with `biomass` held
    /// at its value at the start of each integrated interval, and a flux tracking
    /// column `column_id`. The flux parameter is created with value 0 when it doesn't exist.
    pub fn add_flux_update(
        &mut self,
        column_id: &str,
        flux_parameter: &str,
        species: &str,
        biomass: &str,
        coefficient: f64,
    ) -> Result<(), BioreactorError> {
        if self.updates.contains_key(column_id) {
            return Err(BioreactorError::DuplicateColumn(column_id.to_string()));
        }
        let species = self.species_index(species)?;
        let biomass = self.species_index(biomass)?;
        let flux_parameter = match self.parameters.get_index_of(flux_parameter) {
            Some(index) => index,
            None => self.add_parameter(flux_parameter, 0.)?,
        };
        self.updates.insert(
            column_id.to_string(),
            FluxUpdate {
                species,
                biomass,
                flux_parameter,
                coefficient,
            },
        );
        Ok(())
    }

    /// Add `d[species]/dt += rate(species values, parameter values)`
    pub fn add_kinetic_rate<F>(&mut self, species: &str, rate: F) -> Result<(), BioreactorError>
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        let species = self.species_index(species)?;
        self.kinetics.push(KineticTerm {
            species,
            rate: Box::new(rate),
        });
        Ok(())
    }

    /// Whether negative pools are clamped to zero after every interval (default true)
    ///
    /// Clamping more than the absolute tolerance away is logged as a warning, the exchange bounds
    /// alone keep pools drained by flux updates at zero or above.
    pub fn set_non_negative(&mut self, non_negative: bool) {
        self.non_negative = non_negative;
    }
    // endregion Building

    // region Accessors
    pub fn species_index(&self, id: &str) -> Result<usize, BioreactorError> {
        self.species
            .get_index_of(id)
            .ok_or_else(|| BioreactorError::UnknownSpecies(id.to_string()))
    }

    pub fn parameter_index(&self, id: &str) -> Result<usize, BioreactorError> {
        self.parameters
            .get_index_of(id)
            .ok_or_else(|| BioreactorError::UnknownParameter(id.to_string()))
    }

    /// Current value of a species
    pub fn species_value(&self, id: &str) -> Option<f64> {
        self.species.get_index_of(id).map(|index| self.state[index])
    }

    pub fn parameter_value(&self, id: &str) -> Option<f64> {
        self.parameters
            .get_index_of(id)
            .map(|index| self.parameter_values[index])
    }

    pub fn time(&self) -> f64 {
        self.time
    }
    // endregion Accessors

    /// Current rate of every flux update, in column order
    fn column_rates(&self, y: &State) -> Vec<f64> {
        self.updates
            .values()
            .map(|u| u.coefficient * self.parameter_values[u.flux_parameter] * y[u.biomass])
            .collect()
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            time: self.time,
            state: self.state.iter().copied().collect(),
            flux_columns: self.column_rates(&self.state),
        }
    }

    fn rhs(&self, y: &State) -> State {
        let mut dydt = State::zeros(y.len());
        for (update, biomass) in self.updates.values().zip(&self.interval_biomass) {
            dydt[update.species] +=
                update.coefficient * self.parameter_values[update.flux_parameter] * biomass;
        }
        if !self.kinetics.is_empty() {
            let species = y.as_slice();
            for term in &self.kinetics {
                dydt[term.species] += (term.rate)(species, &self.parameter_values);
            }
        }
        dydt
    }

    fn clamp_negative_pools(&mut self) {
        if !self.non_negative {
            return;
        }
        for (id, value) in self.species.keys().zip(self.state.iter_mut()) {
            if *value < 0. {
                if *value < -self.absolute_tolerance {
                    tracing::warn!(
                        species = id.as_str(),
                        amount = *value,
                        time = self.time,
                        "Clamped negative pool to zero"
                    );
                }
                *value = 0.;
            }
        }
    }
}

impl<I: Integrator> System<f64, State> for &BioreactorModel<I> {
    fn system(&self, _t: f64, y: &State, dy: &mut State) {
        *dy = self.rhs(y);
    }
}

impl<I: Integrator> ContinuousModel for BioreactorModel<I> {
    fn variable_ids(&self) -> Vec<String> {
        self.species.keys().cloned().collect()
    }

    fn parameter_ids(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    fn flux_column_ids(&self) -> Vec<String> {
        self.updates.keys().cloned().collect()
    }

    fn reset(&mut self) {
        self.time = 0.;
        self.state = State::from_iterator(self.species.len(), self.species.values().copied());
        self.parameter_values = self.parameters.values().copied().collect();
    }

    fn set_parameter(&mut self, parameter: ParameterIdx, value: f64) {
        if let Some(slot) = self.parameter_values.get_mut(parameter.index()) {
            *slot = value;
        }
    }

    fn configure_integrator_tolerances(&mut self, absolute: f64, relative: f64) {
        self.absolute_tolerance = absolute;
        self.integrator.set_tolerances(absolute, relative);
    }

    fn integrate(&mut self, start: f64, end: f64) -> Result<IntervalSnapshots, IntegrationError> {
        self.time = start;
        let start_snapshot = self.snapshot();
        self.interval_biomass = self.updates.values().map(|u| self.state[u.biomass]).collect();
        let end_state = self.integrator.integrate(&*self, &self.state, start, end)?;
        self.state = end_state;
        self.time = end;
        self.clamp_negative_pools();
        Ok(IntervalSnapshots {
            start: start_snapshot,
            end: self.snapshot(),
        })
    }
}

/// Errors raised while building a [`BioreactorModel`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BioreactorError {
    #[error("Species {0} already exists")]
    DuplicateSpecies(String),
    #[error("Parameter {0} already exists")]
    DuplicateParameter(String),
    #[error("Flux column {0} already exists")]
    DuplicateColumn(String),
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("Initial value of {0} is not finite")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::integrator::Rk4;
    use approx::assert_relative_eq;

    fn uptake_reactor() -> BioreactorModel {
        let mut reactor = BioreactorModel::new();
        reactor.add_species("S", 5.).unwrap();
        reactor.add_species("X", 0.5).unwrap();
        reactor
            .add_flux_update("EX_S", "v_EX_S", "S", "X", 1.)
            .unwrap();
        reactor
    }

    #[test]
    fn declared_ids() {
        let reactor = uptake_reactor();
        assert_eq!(reactor.variable_ids(), vec!["S", "X"]);
        assert_eq!(reactor.parameter_ids(), vec!["v_EX_S"]);
        assert_eq!(reactor.flux_column_ids(), vec!["EX_S"]);
        assert!(matches!(
            reactor.species_index("Y"),
            Err(BioreactorError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn constant_biomass_linear_uptake() {
        let mut reactor = uptake_reactor();
        let flux = ParameterIdx(reactor.parameter_index("v_EX_S").unwrap());
        reactor.set_parameter(flux, -2.);
        let snapshots = reactor.integrate(0., 1.).unwrap();
        // dS/dt = -2 * 0.5
        assert_relative_eq!(snapshots.end.state[0], 4., max_relative = 1e-9);
        assert_relative_eq!(snapshots.start.state[0], 5.);
        assert_relative_eq!(snapshots.start.flux_columns[0], -1.);
        assert_relative_eq!(snapshots.end.time, 1.);
    }

    #[test]
    fn kinetic_rate() {
        let mut reactor = BioreactorModel::with_integrator(Rk4 { step: 0.01 });
        reactor.add_species("O2", 0.).unwrap();
        let kla = reactor.add_parameter("kLa", 7.5).unwrap();
        reactor
            .add_kinetic_rate("O2", move |species, parameters| {
                parameters[kla] * (0.21 - species[0])
            })
            .unwrap();
        let snapshots = reactor.integrate(0., 2.).unwrap();
        assert_relative_eq!(
            snapshots.end.state[0],
            0.21 * (1. - (-15.0f64).exp()),
            max_relative = 1e-6
        );
    }

    #[test]
    fn uptake_scaled_by_interval_start_biomass() {
        let mut reactor = uptake_reactor();
        reactor
            .add_flux_update("EX_X", "v_EX_X", "X", "X", 1.)
            .unwrap();
        let growth = ParameterIdx(reactor.parameter_index("v_EX_X").unwrap());
        let uptake = ParameterIdx(reactor.parameter_index("v_EX_S").unwrap());
        reactor.set_parameter(growth, 1.);
        // Empties S within the interval, -S / (X * dt)
        reactor.set_parameter(uptake, -10.);
        reactor.set_non_negative(false);
        let snapshots = reactor.integrate(0., 1.).unwrap();
        assert!(snapshots.end.state[0].abs() < 1e-9);
        assert_relative_eq!(snapshots.end.state[1], 1., max_relative = 1e-9);
    }

    #[test]
    fn clamping_can_be_disabled() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut drained = uptake_reactor();
        let flux = ParameterIdx(drained.parameter_index("v_EX_S").unwrap());
        drained.set_parameter(flux, -100.);
        let snapshots = drained.integrate(0., 1.).unwrap();
        assert_eq!(snapshots.end.state[0], 0.);

        let mut unclamped = uptake_reactor();
        unclamped.set_non_negative(false);
        unclamped.set_parameter(flux, -100.);
        let snapshots = unclamped.integrate(0., 1.).unwrap();
        // 5 - 100 * 0.5
        assert_relative_eq!(snapshots.end.state[0], -45., max_relative = 1e-9);
    }

    #[test]
    fn reset_restores_initial_values() {
        let mut reactor = uptake_reactor();
        let flux = ParameterIdx(reactor.parameter_index("v_EX_S").unwrap());
        reactor.set_parameter(flux, -1.);
        reactor.integrate(0., 1.).unwrap();
        reactor.reset();
        assert_eq!(reactor.species_value("S"), Some(5.));
        assert_eq!(reactor.parameter_value("v_EX_S"), Some(0.));
        assert_eq!(reactor.time(), 0.);
    }

    #[test]
    fn zero_length_interval_seeds_snapshot() {
        let mut reactor = uptake_reactor();
        let snapshots = reactor.integrate(0., 0.).unwrap();
        assert_eq!(snapshots.start, snapshots.end);
        assert_eq!(snapshots.end.state, vec![5., 0.5]);
    }
}

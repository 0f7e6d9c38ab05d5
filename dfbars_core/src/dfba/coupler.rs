//! The coupling loop between the flux model and the continuous model
//!
//! Every step runs `BoundsUpdate -> Optimize -> Inject -> Integrate -> Record`. A failure in any
//! of these ends the run with the rows recorded so far instead of an error.

use std::time::{Duration, Instant};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::dfba::accumulator::{ResultAccumulator, SimulationTrace};
use crate::dfba::bounds::{BoundsTranslator, ExchangeBinding, KineticLimit};
use crate::dfba::collaborators::{ContinuousModel, OptimizationModel, StateSnapshot};
use crate::dfba::error::{ConfigurationError, FailureReason, StepFailure};
use crate::dfba::injector::FluxInjector;
use crate::dfba::optimization::OptimizationStep;
use crate::dfba::settings::SimulationSettings;

/// Declared correspondences between the identifiers of the two models
///
/// # Examples
/// ```rust
/// use dfbars_core::dfba::bounds::KineticLimit;
/// use dfbars_core::dfba::coupler::CouplingBindingsBuilder;
/// let bindings = CouplingBindingsBuilder::default()
///     .biomass("X")
///     .exchange("EX_A", "A", KineticLimit::Declared)
///     .exchange("EX_X", "X", KineticLimit::Declared)
///     .flux("EX_A", "v_EX_A", "EX_A")
///     .flux("EX_X", "v_EX_X", "EX_X")
///     .build()
///     .unwrap();
/// assert_eq!(bindings.conversion, 1.);
/// assert_eq!(bindings.flux_parameters.len(), 2);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingBindings {
    /// State variable normalizing the flux rates
    #[builder(setter(into))]
    pub biomass: String,
    /// Factor turning biomass specific fluxes into pool rates
    #[builder(default = "1.")]
    pub conversion: f64,
    /// Pools exchanged by every exchange reaction
    #[builder(default = "Vec::new()")]
    pub exchanges: Vec<ExchangeBinding>,
    /// (reaction, parameter) pairs receiving the optimized fluxes
    #[builder(default = "Vec::new()")]
    pub flux_parameters: Vec<(String, String)>,
    /// (reaction, flux column) pairs replaced by the optimized fluxes in the trace
    #[builder(default = "Vec::new()")]
    pub flux_columns: Vec<(String, String)>,
}

impl CouplingBindingsBuilder {
    /// Bind an exchange reaction to the pool it exchanges
    pub fn exchange(
        &mut self,
        reaction: &str,
        species: &str,
        kinetic: KineticLimit,
    ) -> &mut Self {
        self.exchanges
            .get_or_insert_with(Vec::new)
            .push(ExchangeBinding::new(reaction, species, kinetic));
        self
    }

    /// Route the flux of a reaction to a parameter and a flux tracking column
    pub fn flux(&mut self, reaction: &str, parameter: &str, column: &str) -> &mut Self {
        self.flux_parameters
            .get_or_insert_with(Vec::new)
            .push((reaction.to_string(), parameter.to_string()));
        self.flux_columns
            .get_or_insert_with(Vec::new)
            .push((reaction.to_string(), column.to_string()));
        self
    }
}

/// Position of the coupler in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouplerState {
    Init,
    BoundsUpdate,
    Optimize,
    Inject,
    Integrate,
    Record,
    Terminated,
    Aborted,
}

/// Result of a run
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// Every step completed
    Complete(SimulationTrace),
    /// The run stopped at `failure.step`, the trace holds the rows before it
    Partial {
        trace: SimulationTrace,
        failure: StepFailure,
    },
}

impl SimulationOutcome {
    pub fn trace(&self) -> &SimulationTrace {
        match self {
            SimulationOutcome::Complete(trace) => trace,
            SimulationOutcome::Partial { trace, .. } => trace,
        }
    }

    pub fn into_trace(self) -> SimulationTrace {
        match self {
            SimulationOutcome::Complete(trace) => trace,
            SimulationOutcome::Partial { trace, .. } => trace,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SimulationOutcome::Complete(_))
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        match self {
            SimulationOutcome::Complete(_) => None,
            SimulationOutcome::Partial { failure, .. } => Some(failure),
        }
    }
}

/// Drives an optimization model and a continuous model through a simulation
///
/// The coupler holds exclusive borrows of both models for its lifetime, the models never see
/// each other.
pub struct DfbaCoupler<'a, O: OptimizationModel + ?Sized, C: ContinuousModel + ?Sized> {
    optimization: &'a mut O,
    continuous: &'a mut C,
    bindings: CouplingBindings,
    bounds: BoundsTranslator,
    injector: FluxInjector,
    state: CouplerState,
    /// Step size of the last run, continuation runs must reuse it
    previous_dt: Option<f64>,
}

impl<'a, O: OptimizationModel + ?Sized, C: ContinuousModel + ?Sized> DfbaCoupler<'a, O, C> {
    /// Resolve every binding against the two models
    pub fn new(
        optimization: &'a mut O,
        continuous: &'a mut C,
        bindings: CouplingBindings,
    ) -> Result<Self, ConfigurationError> {
        let reaction_ids = optimization.reaction_ids();
        let variable_ids = continuous.variable_ids();
        let bounds = BoundsTranslator::new(
            &*optimization,
            &variable_ids,
            &bindings.biomass,
            bindings.conversion,
            &bindings.exchanges,
        )?;
        let injector = FluxInjector::new(
            &reaction_ids,
            &continuous.parameter_ids(),
            &bindings.flux_parameters,
        )?;
        // Fail early on unknown flux columns
        Self::accumulator(&*optimization, &*continuous, &bounds, &bindings)?;
        Ok(Self {
            optimization,
            continuous,
            bindings,
            bounds,
            injector,
            state: CouplerState::Init,
            previous_dt: None,
        })
    }

    fn accumulator(
        optimization: &O,
        continuous: &C,
        bounds: &BoundsTranslator,
        bindings: &CouplingBindings,
    ) -> Result<ResultAccumulator, ConfigurationError> {
        ResultAccumulator::new(
            optimization.reaction_ids(),
            continuous.variable_ids(),
            continuous.flux_column_ids(),
            bounds.reaction_ids(),
            &bindings.flux_columns,
        )
    }

    pub fn state(&self) -> CouplerState {
        self.state
    }

    fn transition(&mut self, next: CouplerState, step: usize) {
        tracing::trace!(step, from = ?self.state, to = ?next, "Coupler transition");
        self.state = next;
    }

    /// Run a simulation over the horizon of `settings`
    ///
    /// Configuration errors are returned before either model is touched. Failures while
    /// stepping end the run with [`SimulationOutcome::Partial`].
    pub fn simulate(
        &mut self,
        settings: &SimulationSettings,
    ) -> Result<SimulationOutcome, ConfigurationError> {
        let steps = settings.steps()?;
        if !settings.reset {
            if let Some(previous) = self.previous_dt {
                if (previous - settings.dt).abs() > settings.abs_tol {
                    return Err(ConfigurationError::DtMismatch {
                        previous,
                        requested: settings.dt,
                    });
                }
            }
        }
        let mut accumulator =
            Self::accumulator(&*self.optimization, &*self.continuous, &self.bounds, &self.bindings)?;
        let optimizer = OptimizationStep::from_settings(settings);

        tracing::info!(
            tstart = settings.tstart,
            tend = settings.tend,
            dt = settings.dt,
            steps,
            "Starting simulation"
        );
        let started = Instant::now();
        self.state = CouplerState::Init;
        self.previous_dt = Some(settings.dt);
        if settings.reset {
            self.continuous.reset();
        }
        self.continuous
            .configure_integrator_tolerances(settings.abs_tol, settings.rel_tol);

        // Zero length evaluation seeding the first bounds
        let mut next_row = match self.continuous.integrate(settings.tstart, settings.tstart) {
            Ok(snapshots) => snapshots.end,
            Err(error) => {
                let failure = StepFailure {
                    step: 0,
                    time: settings.tstart,
                    reason: error.into(),
                };
                return Ok(self.abort(accumulator, failure, started));
            }
        };

        for step in 0..=steps {
            let time = settings.time_at(step);
            // The last row closes the horizon and isn't integrated past it
            let end = if step == steps { time } else { time + settings.dt };
            match self.couple(step, time, end, &next_row, settings, &optimizer, &mut accumulator) {
                Ok(row) => next_row = row,
                Err(reason) => {
                    let failure = StepFailure { step, time, reason };
                    return Ok(self.abort(accumulator, failure, started));
                }
            }
        }

        self.state = CouplerState::Terminated;
        let mut trace = accumulator.into_trace();
        trace.simulation_time = Some(started.elapsed());
        tracing::info!(
            rows = trace.len(),
            elapsed = ?trace.simulation_time,
            "Simulation finished"
        );
        Ok(SimulationOutcome::Complete(trace))
    }

    /// One pass through the loop, returns the snapshot at the end of the step
    #[allow(clippy::too_many_arguments)]
    fn couple(
        &mut self,
        step: usize,
        time: f64,
        end: f64,
        row: &StateSnapshot,
        settings: &SimulationSettings,
        optimizer: &OptimizationStep,
        accumulator: &mut ResultAccumulator,
    ) -> Result<StateSnapshot, FailureReason> {
        self.transition(CouplerState::BoundsUpdate, step);
        let updates = self
            .bounds
            .translate(&row.state, settings.dt, settings.abs_tol);
        for update in &updates {
            self.optimization.set_bounds(update.reaction, update.bounds);
        }

        self.transition(CouplerState::Optimize, step);
        let optimum = optimizer.run(&mut *self.optimization)?;

        self.transition(CouplerState::Inject, step);
        self.injector.inject(&optimum.fluxes, &mut *self.continuous);

        self.transition(CouplerState::Integrate, step);
        let snapshots = self.continuous.integrate(time, end)?;

        self.transition(CouplerState::Record, step);
        accumulator.record(step, time, snapshots.start, &optimum, &updates);
        Ok(snapshots.end)
    }

    fn abort(
        &mut self,
        accumulator: ResultAccumulator,
        failure: StepFailure,
        started: Instant,
    ) -> SimulationOutcome {
        self.state = CouplerState::Aborted;
        tracing::error!(
            step = failure.step,
            time = failure.time,
            reason = %failure.reason,
            "Simulation aborted, returning partial trace"
        );
        let mut trace = accumulator.into_trace();
        trace.simulation_time = Some(started.elapsed());
        SimulationOutcome::Partial { trace, failure }
    }

    /// Time `n_repeat` complete runs, each starting from the initial values
    pub fn benchmark(
        &mut self,
        n_repeat: usize,
        settings: &SimulationSettings,
    ) -> Result<Vec<Duration>, ConfigurationError> {
        let settings = SimulationSettings {
            reset: true,
            ..settings.clone()
        };
        let mut durations = Vec::with_capacity(n_repeat);
        for _ in 0..n_repeat {
            let outcome = self.simulate(&settings)?;
            durations.push(outcome.trace().simulation_time.unwrap_or_default());
        }
        Ok(durations)
    }
}

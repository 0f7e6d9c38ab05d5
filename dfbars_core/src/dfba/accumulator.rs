//! Simulation trace assembled one coupling step at a time
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dfba::bounds::BoundUpdate;
use crate::dfba::collaborators::{ColumnIdx, ReactionIdx, StateSnapshot};
use crate::dfba::error::ConfigurationError;
use crate::dfba::optimization::StepOptimum;
use crate::flux_analysis::OptimalityRange;
use crate::metabolic_model::reaction::FluxBounds;

/// One row of the trace, the state at the start of a step with the fluxes used over that step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStepRecord {
    pub step: usize,
    pub time: f64,
    /// Values of the state variables, ordered like [`SimulationTrace::variable_ids`]
    pub state: Vec<f64>,
    /// Flux tracking columns, ordered like [`SimulationTrace::flux_column_ids`]
    pub flux_columns: Vec<f64>,
    /// Optimized flux of every reaction, ordered like [`SimulationTrace::reaction_ids`]
    pub fluxes: Vec<f64>,
    pub objective_value: f64,
    /// Exchange bounds of the step, ordered like [`SimulationTrace::bound_ids`]
    pub bounds: Vec<FluxBounds>,
}

/// Aggregate uniqueness of the optima of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniquenessSummary {
    /// The diagnostic was disabled
    Unchecked,
    AllUnique,
    /// Steps with a non-unique optimum
    NotUnique(Vec<usize>),
}

/// Rows of a run with the parallel uniqueness trace
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationTrace {
    pub variable_ids: Vec<String>,
    pub flux_column_ids: Vec<String>,
    pub reaction_ids: Vec<String>,
    pub bound_ids: Vec<String>,
    pub records: Vec<TimeStepRecord>,
    /// Flux ranges per step, None when the diagnostic was disabled
    pub optimality_ranges: Vec<Option<OptimalityRange>>,
    /// Uniqueness per step, None when the diagnostic was disabled
    pub unique: Vec<Option<bool>>,
    /// Wall clock duration of the run
    pub simulation_time: Option<Duration>,
}

impl SimulationTrace {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.time).collect()
    }

    /// Values of a state variable over time
    pub fn species(&self, id: &str) -> Option<Vec<f64>> {
        let index = self.variable_ids.iter().position(|v| v == id)?;
        Some(self.records.iter().map(|r| r.state[index]).collect())
    }

    /// Optimized flux of a reaction over time
    pub fn flux(&self, id: &str) -> Option<Vec<f64>> {
        let index = self.reaction_ids.iter().position(|v| v == id)?;
        Some(self.records.iter().map(|r| r.fluxes[index]).collect())
    }

    /// Values of a flux tracking column over time
    pub fn flux_column(&self, id: &str) -> Option<Vec<f64>> {
        let index = self.flux_column_ids.iter().position(|v| v == id)?;
        Some(self.records.iter().map(|r| r.flux_columns[index]).collect())
    }

    /// Bounds of an exchange reaction over time
    pub fn bounds(&self, id: &str) -> Option<Vec<FluxBounds>> {
        let index = self.bound_ids.iter().position(|v| v == id)?;
        Some(self.records.iter().map(|r| r.bounds[index]).collect())
    }

    pub fn objective_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.objective_value).collect()
    }

    /// Mean flux range per step, None where the diagnostic was disabled
    pub fn non_uniqueness(&self) -> Vec<Option<f64>> {
        self.optimality_ranges
            .iter()
            .map(|r| r.as_ref().map(OptimalityRange::non_uniqueness))
            .collect()
    }

    pub fn uniqueness_summary(&self) -> UniquenessSummary {
        if self.unique.iter().all(Option::is_none) {
            return UniquenessSummary::Unchecked;
        }
        let not_unique: Vec<usize> = self
            .unique
            .iter()
            .enumerate()
            .filter(|(_, u)| **u == Some(false))
            .map(|(step, _)| step)
            .collect();
        if not_unique.is_empty() {
            UniquenessSummary::AllUnique
        } else {
            UniquenessSummary::NotUnique(not_unique)
        }
    }
}

/// Builds the [`SimulationTrace`] of a run
#[derive(Debug, Clone)]
pub struct ResultAccumulator {
    columns: Vec<(ReactionIdx, ColumnIdx)>,
    trace: SimulationTrace,
}

impl ResultAccumulator {
    /// Resolve the (reaction, flux column) pairs whose columns get replaced by optimized fluxes
    pub fn new(
        reaction_ids: Vec<String>,
        variable_ids: Vec<String>,
        flux_column_ids: Vec<String>,
        bound_ids: Vec<String>,
        mapping: &[(String, String)],
    ) -> Result<Self, ConfigurationError> {
        let columns = mapping
            .iter()
            .map(|(reaction, column)| {
                Ok((
                    ReactionIdx::resolve(&reaction_ids, reaction)?,
                    ColumnIdx::resolve(&flux_column_ids, column)?,
                ))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        Ok(Self {
            columns,
            trace: SimulationTrace {
                variable_ids,
                flux_column_ids,
                reaction_ids,
                bound_ids,
                ..SimulationTrace::default()
            },
        })
    }

    /// Append the row of a completed step
    ///
    /// `start` is the snapshot at the start of the step, its flux columns are overwritten with the
    /// optimized fluxes of the mapped reactions.
    pub fn record(
        &mut self,
        step: usize,
        time: f64,
        start: StateSnapshot,
        optimum: &StepOptimum,
        bounds: &[BoundUpdate],
    ) {
        let fluxes: Vec<f64> = optimum.fluxes.fluxes.values().copied().collect();
        let mut flux_columns = start.flux_columns;
        for (reaction, column) in &self.columns {
            if let (Some(slot), Some(value)) = (
                flux_columns.get_mut(column.index()),
                fluxes.get(reaction.index()),
            ) {
                *slot = *value;
            }
        }
        self.trace.records.push(TimeStepRecord {
            step,
            time,
            state: start.state,
            flux_columns,
            fluxes,
            objective_value: optimum.fluxes.objective_value.unwrap_or(f64::NAN),
            bounds: bounds.iter().map(|b| b.bounds).collect(),
        });
        self.trace.optimality_ranges.push(optimum.range.clone());
        self.trace.unique.push(optimum.unique);
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn into_trace(self) -> SimulationTrace {
        self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_analysis::{FluxRange, FluxVector};
    use crate::optimize::OptimizationStatus;
    use indexmap::IndexMap;

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn accumulator() -> ResultAccumulator {
        ResultAccumulator::new(
            strings(&["EX_A", "R1"]),
            strings(&["A", "X"]),
            strings(&["EX_A"]),
            strings(&["EX_A"]),
            &[("EX_A".to_string(), "EX_A".to_string())],
        )
        .unwrap()
    }

    fn optimum(flux: f64, unique: Option<bool>) -> StepOptimum {
        StepOptimum {
            fluxes: FluxVector {
                status: OptimizationStatus::Optimal,
                objective_value: Some(-flux),
                fluxes: IndexMap::from([("EX_A".to_string(), flux), ("R1".to_string(), -flux)]),
            },
            range: unique.map(|u| OptimalityRange {
                ranges: IndexMap::from([(
                    "R1".to_string(),
                    FluxRange {
                        minimum: 0.,
                        maximum: if u { 0. } else { 1. },
                    },
                )]),
            }),
            unique,
        }
    }

    fn snapshot(time: f64) -> StateSnapshot {
        StateSnapshot {
            time,
            state: vec![10. - time, 1.],
            // Internal rate of the update term, not the flux
            flux_columns: vec![-123.],
        }
    }

    #[test]
    fn flux_columns_replaced_by_optimized_fluxes() {
        let mut acc = accumulator();
        let bounds = [BoundUpdate {
            reaction: ReactionIdx(0),
            bounds: FluxBounds::new(-10., 0.),
        }];
        acc.record(0, 0., snapshot(0.), &optimum(-2., None), &bounds);
        let trace = acc.into_trace();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.flux_column("EX_A"), Some(vec![-2.]));
        assert_eq!(trace.flux("R1"), Some(vec![2.]));
        assert_eq!(trace.species("A"), Some(vec![10.]));
        assert_eq!(trace.bounds("EX_A"), Some(vec![FluxBounds::new(-10., 0.)]));
        assert_eq!(trace.objective_values(), vec![2.]);
        assert_eq!(trace.species("B"), None);
    }

    #[test]
    fn uniqueness_trace() {
        let mut acc = accumulator();
        acc.record(0, 0., snapshot(0.), &optimum(-1., None), &[]);
        assert_eq!(
            acc.clone().into_trace().uniqueness_summary(),
            UniquenessSummary::Unchecked
        );

        let mut acc = accumulator();
        acc.record(0, 0., snapshot(0.), &optimum(-1., Some(true)), &[]);
        acc.record(1, 0.1, snapshot(0.1), &optimum(-1., Some(false)), &[]);
        acc.record(2, 0.2, snapshot(0.2), &optimum(-1., Some(true)), &[]);
        let trace = acc.into_trace();
        assert_eq!(trace.uniqueness_summary(), UniquenessSummary::NotUnique(vec![1]));
        assert_eq!(trace.non_uniqueness(), vec![Some(0.), Some(1.), Some(0.)]);
        assert_eq!(trace.times(), vec![0., 0.1, 0.2]);
    }

    #[test]
    fn unknown_column_rejected() {
        let res = ResultAccumulator::new(
            strings(&["EX_A"]),
            strings(&["A"]),
            strings(&["EX_A"]),
            Vec::new(),
            &[("EX_A".to_string(), "EX_B".to_string())],
        );
        assert!(matches!(
            res,
            Err(ConfigurationError::UnknownIdentifier { kind: "flux column", .. })
        ));
    }
}

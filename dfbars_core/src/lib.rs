//! Dynamic flux balance analysis.
//!
//! A steady state metabolic network ([`metabolic_model`]) is optimized with linear programs
//! ([`optimize`], [`flux_analysis`]) while the extracellular pools it exchanges with evolve as
//! ODEs ([`ode`]). The [`dfba`] module couples the two in fixed time steps.

pub mod configuration;
pub mod dfba;
pub mod flux_analysis;
pub mod io;
pub mod metabolic_model;
pub mod ode;
pub mod optimize;
mod utils;

//! Continuous model side of a dynamic simulation

pub mod bioreactor;
pub mod integrator;

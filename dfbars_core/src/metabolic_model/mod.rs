//! Module providing the Model struct for representing a metabolic network.

pub mod metabolite;
pub mod model;
pub mod reaction;

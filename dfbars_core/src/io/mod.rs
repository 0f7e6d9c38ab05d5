//! Module for reading and writing metabolic Models
pub mod json;

pub use json::JsonError;

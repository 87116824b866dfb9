//! Alert definitions and threshold evaluation
//!
//! Definitions are owned by an external administrator. This crate only reads
//! a full snapshot once per run.

pub mod definition;
pub mod evaluator;

pub use definition::{AlertDefinition, DEFAULT_ALERT_ID};
pub use evaluator::evaluate;

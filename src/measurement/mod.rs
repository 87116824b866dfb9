//! Station measurements: fetching and parsing

pub mod client;
pub mod parse;

pub use client::{MeasurementClient, MeasurementConfig, MeasurementError, MeasurementSource};
pub use parse::{convert_to_number, parse_measurement, Measurement, PLACEHOLDER_LEVEL};

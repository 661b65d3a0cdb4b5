// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
pub mod telemetry;
pub mod validation;

pub use telemetry::{MeasureEntry, PerformanceRecorder, PerformanceReport};
pub use validation::Validator;

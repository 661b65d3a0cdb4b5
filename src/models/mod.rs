// file: src/models/mod.rs
// description: data models exchanged between the orchestrator and pipeline backends
// reference: internal module structure

pub mod generation;
pub mod progress_event;

pub use generation::{GenerationOptions, SummaryOutput};
pub use progress_event::{LoadStatus, ProgressEvent};

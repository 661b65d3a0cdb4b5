// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod backend;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use backend::HubPipelineFactory;
pub use config::{Config, InferenceConfig, ModelConfig, PipelineConfig, RunPolicy};
pub use error::{PipelineError, Result};
pub use host::{ConsoleStatusSink, MemorySink, ShutdownHooks, StdoutSink, TextSink};
pub use models::{GenerationOptions, LoadStatus, ProgressEvent, SummaryOutput};
pub use pipeline::{
    LifecycleController, LifecycleState, PipelineFactory, PipelineHandle, PipelineRequest,
    ProgressAggregator, RunGuardFlags, RunOutcome, SummaryOrchestrator,
};
pub use utils::{PerformanceRecorder, PerformanceReport, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let _request = PipelineRequest::from(&config.model);
        let _controller = LifecycleController::new(config.pipeline.run_policy);
        let _recorder = PerformanceRecorder::new();
    }
}

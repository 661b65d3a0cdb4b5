// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod lifecycle;
mod orchestrator;
mod progress;
pub mod resource;

pub use lifecycle::{
    LifecycleController, LifecycleEvent, LifecycleState, RunGuardFlags, RunPermit, transition,
};
pub use orchestrator::{
    MARK_INFERENCE_END, MARK_INFERENCE_START, MARK_INIT_START, MARK_PIPELINE_READY,
    MARK_TOTAL_END, MEASURE_INFERENCE, MEASURE_INITIALIZATION, MEASURE_TOTAL, RunOutcome,
    STATUS_GENERATING, STATUS_LOADING, STATUS_READY, STATUS_SUCCESS, SummaryOrchestrator,
};
pub use progress::{ProgressAggregator, loading_message};
pub use resource::{
    PipelineFactory, PipelineHandle, PipelineRequest, ProgressSender, progress_channel,
};

// file: src/pipeline/resource.rs
// description: contract between the orchestrator and an external inference pipeline
// reference: https://docs.rs/async-trait

use crate::config::ModelConfig;
use crate::error::Result;
use crate::models::{GenerationOptions, ProgressEvent, SummaryOutput};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where a factory pushes per-file load events while it initializes.
pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// What to load. Runtime knobs are passed through to the factory untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub task: String,
    pub model_id: String,
    pub quantized: bool,
    pub num_threads: Option<usize>,
}

impl PipelineRequest {
    pub fn new(task: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            model_id: model_id.into(),
            quantized: true,
            num_threads: None,
        }
    }
}

impl From<&ModelConfig> for PipelineRequest {
    fn from(model: &ModelConfig) -> Self {
        Self {
            task: model.task.clone(),
            model_id: model.model_id.clone(),
            quantized: model.quantized,
            num_threads: model.num_threads,
        }
    }
}

/// A loaded, stateful inference pipeline.
#[async_trait]
pub trait PipelineHandle: Send + Sync {
    async fn invoke(&self, text: &str, options: &GenerationOptions) -> Result<Vec<SummaryOutput>>;

    async fn dispose(&self) -> Result<()>;
}

/// Loads pipelines. Implementations should report per-file progress on `progress`
/// and drop it once loading has finished.
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn create(
        &self,
        request: &PipelineRequest,
        progress: ProgressSender,
    ) -> Result<Arc<dyn PipelineHandle>>;
}

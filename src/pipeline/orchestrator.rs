// file: src/pipeline/orchestrator.rs
// description: drives one summarization: guard, load with progress, invoke, publish, report timings
// reference: orchestrates asynchronous summarization workflow

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::host::TextSink;
use crate::models::{GenerationOptions, ProgressEvent};
use crate::pipeline::lifecycle::{LifecycleController, RunPermit};
use crate::pipeline::progress::{ProgressAggregator, loading_message};
use crate::pipeline::resource::{PipelineFactory, PipelineRequest, progress_channel};
use crate::utils::{PerformanceRecorder, PerformanceReport, Validator};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

pub const MARK_INIT_START: &str = "init_start";
pub const MARK_PIPELINE_READY: &str = "pipeline_ready";
pub const MARK_INFERENCE_START: &str = "inference_start";
pub const MARK_INFERENCE_END: &str = "inference_end";
pub const MARK_TOTAL_END: &str = "total_end";

pub const MEASURE_INITIALIZATION: &str = "Pipeline Initialization";
pub const MEASURE_INFERENCE: &str = "Inference Time";
pub const MEASURE_TOTAL: &str = "Total Time";

pub const STATUS_LOADING: &str = "Loading summarization model...";
pub const STATUS_READY: &str = "Model loaded";
pub const STATUS_GENERATING: &str = "Generating summary...";
pub const STATUS_SUCCESS: &str = "Summary generated!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { summary: String },
    Failed { message: String },
    /// Another run held the guard; nothing happened.
    Rejected,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

pub struct SummaryOrchestrator {
    lifecycle: Arc<LifecycleController>,
    factory: Arc<dyn PipelineFactory>,
    request: PipelineRequest,
    status: Arc<dyn TextSink>,
    summary: Arc<dyn TextSink>,
    recorder: Mutex<PerformanceRecorder>,
}

impl SummaryOrchestrator {
    pub fn new(
        lifecycle: Arc<LifecycleController>,
        factory: Arc<dyn PipelineFactory>,
        request: PipelineRequest,
        status: Arc<dyn TextSink>,
        summary: Arc<dyn TextSink>,
    ) -> Self {
        Self {
            lifecycle,
            factory,
            request,
            status,
            summary,
            recorder: Mutex::new(PerformanceRecorder::new()),
        }
    }

    pub fn from_config(
        config: &Config,
        factory: Arc<dyn PipelineFactory>,
        status: Arc<dyn TextSink>,
        summary: Arc<dyn TextSink>,
    ) -> Self {
        let lifecycle = Arc::new(LifecycleController::new(config.pipeline.run_policy));
        Self::new(
            lifecycle,
            factory,
            PipelineRequest::from(&config.model),
            status,
            summary,
        )
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    /// Summarize `input`. Failures are reported through the status sink and the
    /// returned outcome; nothing propagates.
    pub async fn run(&self, input: &str, options: &GenerationOptions) -> RunOutcome {
        let Some(permit) = self.lifecycle.start() else {
            debug!("Summarization already in progress or completed; request ignored");
            return RunOutcome::Rejected;
        };

        self.recorder().mark(MARK_INIT_START);

        let outcome = match self.execute(&permit, input, options).await {
            Ok(summary) => {
                self.status.write(STATUS_SUCCESS);
                RunOutcome::Completed { summary }
            }
            Err(e) => {
                error!(error = ?e, "Pipeline error: {}", e);
                let message = e.user_message();
                self.status.write(&format!("Error: {}", message));
                RunOutcome::Failed { message }
            }
        };

        {
            let mut recorder = self.recorder();
            recorder.mark(MARK_TOTAL_END);
            recorder.measure(MEASURE_TOTAL, MARK_INIT_START, MARK_TOTAL_END);
        }
        drop(permit);

        info!("Performance summary:\n{}", self.performance_summary());
        outcome
    }

    /// Load the pipeline without summarizing anything.
    pub async fn prepare(&self) -> Result<()> {
        let Some(permit) = self.lifecycle.start() else {
            return Err(PipelineError::Initialization(
                "pipeline is busy".to_string(),
            ));
        };

        self.recorder().mark(MARK_INIT_START);
        self.status.write(STATUS_LOADING);

        match self.load(&permit).await {
            Ok(()) => {
                let mut recorder = self.recorder();
                recorder.mark(MARK_PIPELINE_READY);
                recorder.measure(MEASURE_INITIALIZATION, MARK_INIT_START, MARK_PIPELINE_READY);
                drop(recorder);
                self.status.write(STATUS_READY);
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "Pipeline error: {}", e);
                self.status.write(&format!("Error: {}", e.user_message()));
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        permit: &RunPermit,
        input: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        self.status.write(STATUS_LOADING);
        Validator::validate_input_text(input)?;
        Validator::validate_generation_options(options)?;

        self.load(permit).await?;
        {
            let mut recorder = self.recorder();
            recorder.mark(MARK_PIPELINE_READY);
            recorder.measure(MEASURE_INITIALIZATION, MARK_INIT_START, MARK_PIPELINE_READY);
        }

        info!("Model loaded, generating summary...");
        self.status.write(STATUS_GENERATING);
        self.recorder().mark(MARK_INFERENCE_START);

        let result = self.lifecycle.invoke(permit, input, options).await;
        {
            let mut recorder = self.recorder();
            recorder.mark(MARK_INFERENCE_END);
            recorder.measure(MEASURE_INFERENCE, MARK_INFERENCE_START, MARK_INFERENCE_END);
        }

        let first = result?.into_iter().next().ok_or_else(|| {
            PipelineError::Invocation("pipeline returned no summaries".to_string())
        })?;

        debug!(
            "Summary generated: {}",
            Validator::truncate_text(&first.summary_text, 80)
        );
        self.summary.write(&first.summary_text);
        Ok(first.summary_text)
    }

    /// Acquire the handle while feeding load events into the status sink.
    async fn load(&self, permit: &RunPermit) -> Result<()> {
        let (tx, mut rx) = progress_channel();
        let mut aggregator = ProgressAggregator::new();

        let acquire =
            self.lifecycle
                .acquire_resource(permit, self.factory.as_ref(), &self.request, tx);
        tokio::pin!(acquire);

        let result = loop {
            tokio::select! {
                biased;
                Some(event) = rx.recv() => self.report_progress(&mut aggregator, &event),
                result = &mut acquire => break result,
            }
        };

        while let Ok(event) = rx.try_recv() {
            self.report_progress(&mut aggregator, &event);
        }

        if result.is_ok() && aggregator.files_registered() > 0 && !aggregator.is_complete() {
            warn!(
                "Pipeline returned with {}/{} model files reported done",
                aggregator.files_loaded(),
                aggregator.files_registered()
            );
        }

        result.map(|_| ())
    }

    fn report_progress(&self, aggregator: &mut ProgressAggregator, event: &ProgressEvent) {
        if let Some(percent) = aggregator.apply(event) {
            let message = loading_message(percent);
            debug!("{}", message);
            self.status.write(&message);
        }
    }

    pub fn performance_summary(&self) -> String {
        self.recorder().summary()
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.recorder().report()
    }

    fn recorder(&self) -> MutexGuard<'_, PerformanceRecorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

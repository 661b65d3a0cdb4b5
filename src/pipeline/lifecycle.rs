// file: src/pipeline/lifecycle.rs
// description: state machine guarding initialization, reuse and teardown of the pipeline handle
// reference: single long-lived resource shared behind a run guard

use crate::config::RunPolicy;
use crate::error::{PipelineError, Result};
use crate::models::{GenerationOptions, SummaryOutput};
use crate::pipeline::resource::{PipelineFactory, PipelineHandle, PipelineRequest, ProgressSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Initializing,
    Ready,
    Processing,
    Disposing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Initialize,
    Acquired,
    AcquireFailed,
    Invoke,
    InvokeFinished,
    Dispose,
    Disposed,
}

/// Maps `(current, event)` to the next state and whether the move is allowed.
/// Rejected moves leave the state unchanged.
pub fn transition(current: LifecycleState, event: LifecycleEvent) -> (LifecycleState, bool) {
    use LifecycleEvent as E;
    use LifecycleState as S;

    match (current, event) {
        (S::Idle, E::Initialize) => (S::Initializing, true),
        (S::Initializing, E::Acquired) => (S::Ready, true),
        (S::Initializing, E::AcquireFailed) => (S::Idle, true),
        (S::Ready, E::Invoke) => (S::Processing, true),
        (S::Processing, E::InvokeFinished) => (S::Ready, true),
        (S::Initializing | S::Ready | S::Processing, E::Dispose) => (S::Disposing, true),
        (S::Disposing, E::Disposed) => (S::Idle, true),
        (state, _) => (state, false),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunGuardFlags {
    pub is_processing: bool,
    pub is_initialized: bool,
}

struct Inner {
    state: LifecycleState,
    handle: Option<Arc<dyn PipelineHandle>>,
    in_flight: bool,
    /// Event that undoes an acquire or invoke still awaiting its outcome.
    rollback: Option<LifecycleEvent>,
    summarized: bool,
}

impl Inner {
    fn apply(&mut self, event: LifecycleEvent) -> bool {
        let (next, allowed) = transition(self.state, event);
        if allowed {
            debug!("Lifecycle {:?} -> {:?} on {:?}", self.state, next, event);
            self.state = next;
        } else {
            debug!("Lifecycle ignored {:?} while {:?}", event, self.state);
        }
        allowed
    }

    fn flags(&self) -> RunGuardFlags {
        RunGuardFlags {
            is_processing: self.in_flight,
            is_initialized: self.handle.is_some(),
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Proof that the caller passed the run guard. Dropping it clears
/// `is_processing`, whatever path the run took. A run dropped mid-await
/// leaves no state behind: a pending load returns to Idle and a pending
/// invocation to Ready.
pub struct RunPermit {
    inner: Arc<Mutex<Inner>>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        if let Some(event) = inner.rollback.take() {
            warn!("Run abandoned mid-flight; rolling back with {:?}", event);
            inner.apply(event);
        }
        inner.in_flight = false;
    }
}

/// Owns the one pipeline handle of the process.
///
/// The guard is checked synchronously in [`LifecycleController::start`], so of
/// two runs issued back to back only the first gets a permit. The lock is never
/// held across an await.
pub struct LifecycleController {
    inner: Arc<Mutex<Inner>>,
    policy: RunPolicy,
}

impl LifecycleController {
    pub fn new(policy: RunPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: LifecycleState::Idle,
                handle: None,
                in_flight: false,
                rollback: None,
                summarized: false,
            })),
            policy,
        }
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    pub fn state(&self) -> LifecycleState {
        lock(&self.inner).state
    }

    pub fn flags(&self) -> RunGuardFlags {
        lock(&self.inner).flags()
    }

    pub fn is_initialized(&self) -> bool {
        self.flags().is_initialized
    }

    /// Claim the run guard. `None` means busy: a run is in flight, the handle
    /// is being torn down, or the single-shot policy already produced a summary.
    pub fn start(&self) -> Option<RunPermit> {
        let mut inner = lock(&self.inner);
        let flags = inner.flags();

        if flags.is_processing {
            debug!("Run rejected: another run is in progress");
            return None;
        }
        if self.policy == RunPolicy::SingleShot && inner.summarized {
            debug!("Run rejected: pipeline already summarized for this session");
            return None;
        }
        if inner.state == LifecycleState::Disposing {
            debug!("Run rejected: pipeline is being disposed");
            return None;
        }

        inner.in_flight = true;
        Some(RunPermit {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Return the live handle, loading it through `factory` when there is none.
    pub async fn acquire_resource(
        &self,
        _permit: &RunPermit,
        factory: &dyn PipelineFactory,
        request: &PipelineRequest,
        progress: ProgressSender,
    ) -> Result<Arc<dyn PipelineHandle>> {
        {
            let mut inner = lock(&self.inner);
            if inner.state == LifecycleState::Ready
                && let Some(handle) = inner.handle.clone()
            {
                debug!("Reusing loaded {} pipeline", request.model_id);
                return Ok(handle);
            }
            if !inner.apply(LifecycleEvent::Initialize) {
                return Err(PipelineError::Initialization(format!(
                    "cannot initialize pipeline while {:?}",
                    inner.state
                )));
            }
            inner.rollback = Some(LifecycleEvent::AcquireFailed);
        }

        info!(
            "Loading {} pipeline with model {}",
            request.task, request.model_id
        );

        match factory.create(request, progress).await {
            Ok(handle) => {
                let accepted = {
                    let mut inner = lock(&self.inner);
                    inner.rollback = None;
                    let accepted = inner.apply(LifecycleEvent::Acquired);
                    if accepted {
                        inner.handle = Some(Arc::clone(&handle));
                    }
                    accepted
                };

                if accepted {
                    info!("Pipeline ready: {}", request.model_id);
                    return Ok(handle);
                }

                warn!("Pipeline was disposed while initializing; releasing the new handle");
                if let Err(e) = handle.dispose().await {
                    error!("Failed to release abandoned pipeline: {}", e);
                }
                Err(PipelineError::Initialization(
                    "pipeline was disposed during initialization".to_string(),
                ))
            }
            Err(e) => {
                let mut inner = lock(&self.inner);
                inner.rollback = None;
                inner.apply(LifecycleEvent::AcquireFailed);
                inner.handle = None;
                Err(match e {
                    PipelineError::Initialization(_) => e,
                    other => PipelineError::Initialization(other.to_string()),
                })
            }
        }
    }

    /// Run the loaded handle. The handle stays loaded whatever the outcome.
    pub async fn invoke(
        &self,
        _permit: &RunPermit,
        text: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<SummaryOutput>> {
        let handle = {
            let mut inner = lock(&self.inner);
            match inner.handle.clone() {
                Some(handle) if inner.apply(LifecycleEvent::Invoke) => {
                    inner.rollback = Some(LifecycleEvent::InvokeFinished);
                    handle
                }
                _ => {
                    return Err(PipelineError::Invocation(format!(
                        "pipeline is not ready ({:?})",
                        inner.state
                    )));
                }
            }
        };

        let result = handle.invoke(text, options).await;

        {
            let mut inner = lock(&self.inner);
            inner.rollback = None;
            inner.apply(LifecycleEvent::InvokeFinished);
            if result.is_ok() {
                inner.summarized = true;
            }
        }

        result.map_err(|e| match e {
            PipelineError::Invocation(_) => e,
            other => PipelineError::Invocation(other.to_string()),
        })
    }

    /// Release the handle. Failures are logged, never returned.
    pub async fn dispose(&self) {
        let (handle, began) = {
            let mut inner = lock(&self.inner);
            let began = inner.apply(LifecycleEvent::Dispose);
            (inner.handle.take(), began)
        };

        if let Some(handle) = handle {
            info!("Disposing pipeline");
            match handle.dispose().await {
                Ok(()) => debug!("Pipeline disposed"),
                Err(e) => error!("Failed to dispose pipeline: {}", e),
            }
        }

        if began {
            lock(&self.inner).apply(LifecycleEvent::Disposed);
        }
    }
}

// file: src/host/hooks.rs
// description: shutdown hook registry run once at process teardown
// reference: best-effort cleanup with per-hook failure isolation

use crate::error::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info};

type Hook = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// Hooks run in reverse registration order. A failing or panicking hook is
/// logged and the rest still run. Each hook runs at most once.
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Mutex<Vec<(String, Hook)>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&self, name: &str, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        debug!("Registered shutdown hook: {}", name);
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), Box::new(move || hook().boxed())));
    }

    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run and drain every registered hook. Returns how many failed.
    pub async fn run_all(&self) -> usize {
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        if hooks.is_empty() {
            return 0;
        }

        info!("Running {} shutdown hook(s)", hooks.len());
        let mut failures = 0;

        for (name, hook) in hooks.into_iter().rev() {
            let outcome = AssertUnwindSafe(async move { hook().await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => debug!("Shutdown hook completed: {}", name),
                Ok(Err(e)) => {
                    failures += 1;
                    error!("Shutdown hook {} failed: {}", name, e);
                }
                Err(_) => {
                    failures += 1;
                    error!("Shutdown hook {} panicked", name);
                }
            }
        }

        failures
    }

    /// Run `body`, then the hooks, whatever `body` returned.
    pub async fn run_scoped<F, T>(&self, body: F) -> T
    where
        F: Future<Output = T>,
    {
        let output = body.await;
        self.run_all().await;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failing_hook_does_not_block_others() {
        let hooks = ShutdownHooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        hooks.register("first", move || async move {
            first.lock().unwrap().push("first");
            Ok(())
        });
        hooks.register("broken", || async {
            Err::<(), _>(PipelineError::Disposal("handle gone".to_string()))
        });
        hooks.register("panicky", || async {
            if std::hint::black_box(true) {
                panic!("hook exploded");
            }
            Ok(())
        });
        let last = Arc::clone(&order);
        hooks.register("last", move || async move {
            last.lock().unwrap().push("last");
            Ok(())
        });

        assert_eq!(hooks.run_all().await, 2);
        assert_eq!(*order.lock().unwrap(), vec!["last", "first"]);
    }

    #[tokio::test]
    async fn test_hooks_run_once() {
        let hooks = ShutdownHooks::new();
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        hooks.register("count", move || async move {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        assert_eq!(hooks.len(), 1);
        hooks.run_all().await;
        hooks.run_all().await;
        assert!(hooks.is_empty());
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_no_hooks_no_failures() {
        let hooks = ShutdownHooks::new();
        assert_eq!(tokio_test::block_on(hooks.run_all()), 0);
    }

    #[tokio::test]
    async fn test_run_scoped_runs_hooks_after_body() {
        let hooks = ShutdownHooks::new();
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        hooks.register("flag", move || async move {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let value = hooks.run_scoped(async { 7 }).await;
        assert_eq!(value, 7);
        assert!(*ran.lock().unwrap());
    }
}

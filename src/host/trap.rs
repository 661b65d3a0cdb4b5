// file: src/host/trap.rs
// description: last-resort logging for panics and failed background tasks

use tokio::task::JoinError;
use tracing::error;

/// Route panics to the diagnostic log. Sink state is left untouched.
pub fn install_error_trap() {
    std::panic::set_hook(Box::new(|info| {
        error!("Global error: {}", info);
    }));
}

/// Log a background task that panicked or was cancelled.
pub fn log_join_failure<T>(result: Result<T, JoinError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Unhandled rejection: {}", e);
            None
        }
    }
}

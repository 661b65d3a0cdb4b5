// file: src/host/signals.rs
// description: unload and suspend notifications from the hosting process
// reference: https://docs.rs/tokio/latest/tokio/signal

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Interactive interrupt (Ctrl-C).
    Unload,
    /// Host-managed termination (SIGTERM).
    Suspend,
}

/// Resolve when the host asks the process to go away. If no listener can be
/// installed, this never resolves.
pub async fn wait_for_host_signal() -> HostSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = wait_for_interrupt() => HostSignal::Unload,
                    _ = terminate.recv() => HostSignal::Suspend,
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                wait_for_interrupt().await;
                HostSignal::Unload
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_interrupt().await;
        HostSignal::Unload
    }
}

async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

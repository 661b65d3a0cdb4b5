// file: src/host/mod.rs
// description: hosting environment surface: sinks, shutdown hooks, signals, error trap
// reference: internal module structure

pub mod hooks;
pub mod signals;
pub mod sink;
pub mod trap;

pub use hooks::ShutdownHooks;
pub use signals::{HostSignal, wait_for_host_signal};
pub use sink::{ConsoleStatusSink, MemorySink, StdoutSink, TextSink};
pub use trap::{install_error_trap, log_join_failure};

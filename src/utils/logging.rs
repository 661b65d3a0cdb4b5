// file: src/utils/logging.rs
// description: diagnostic log setup on stderr and styled result lines for the terminal

use colored::*;
use tracing_subscriber::fmt::time::Uptime;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Overrides the default filter, e.g. `POPUP_SUMMARIZER_LOG=popup_summarizer=trace`.
pub const LOG_ENV: &str = "POPUP_SUMMARIZER_LOG";

/// Default directives: this crate at `info` (or `debug`), dependencies at `warn`.
pub fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,popup_summarizer={}", level)
}

/// Diagnostics go to stderr so stdout only carries the summary. Timestamps are
/// uptime-relative to line up with the performance marks.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(Uptime::default())
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("{}", format_warning(&format!("Logger already installed: {}", e)));
    }
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

/// `[run/total]` prefix for repeated summarization runs.
pub fn format_step(step: usize, total: usize, msg: &str) -> String {
    format!("{} {}", format!("[{}/{}]", step, total).cyan().bold(), msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatters_keep_message() {
        colored::control::set_override(false);
        assert_eq!(format_success("done"), "✓ done");
        assert_eq!(format_error("boom"), "✗ boom");
        assert_eq!(format_warning("careful"), "⚠ careful");
        assert_eq!(format_step(1, 3, "run"), "[1/3] run");
    }

    #[test]
    fn test_default_directives_scope_verbosity_to_crate() {
        assert_eq!(default_directives(false), "warn,popup_summarizer=info");
        assert_eq!(default_directives(true), "warn,popup_summarizer=debug");
        assert!(EnvFilter::try_new(default_directives(true)).is_ok());
    }
}

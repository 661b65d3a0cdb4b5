// file: src/host/sink.rs
// description: write-only text destinations for status and summary output
// reference: uses indicatif for the console status line

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub trait TextSink: Send + Sync {
    fn write(&self, text: &str);
}

/// Keeps every write; useful for tests and for replaying status history.
#[derive(Debug, Default)]
pub struct MemorySink {
    history: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextSink for MemorySink {
    fn write(&self, text: &str) {
        self.lock().push(text.to_string());
    }
}

/// Single console status line backed by a spinner.
pub struct ConsoleStatusSink {
    bar: ProgressBar,
}

impl ConsoleStatusSink {
    pub fn new(colored: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        let template = if colored {
            "{spinner:.green} [{elapsed_precise}] {msg}"
        } else {
            "{spinner} [{elapsed_precise}] {msg}"
        };
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        let message = self.bar.message();
        self.bar.finish_with_message(message);
    }
}

impl TextSink for ConsoleStatusSink {
    fn write(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }
}

impl Drop for ConsoleStatusSink {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.finish();
        }
    }
}

/// Prints each write on its own line.
pub struct StdoutSink {
    colored: bool,
}

impl StdoutSink {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }
}

impl TextSink for StdoutSink {
    fn write(&self, text: &str) {
        if self.colored {
            println!("\n{}\n{}\n", "Summary".cyan().bold(), text);
        } else {
            println!("\nSummary\n{}\n", text);
        }
    }
}

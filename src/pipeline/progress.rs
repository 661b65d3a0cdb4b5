// file: src/pipeline/progress.rs
// description: aggregates per-file load events into one overall percentage
// reference: tracks load progress across the files of a model

use crate::models::{LoadStatus, ProgressEvent};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FileProgress {
    percent: f64,
    done: bool,
}

/// Per-file load tracker.
///
/// Percentages are stored as reported; values outside `0..=100` are not
/// clamped and flow into the overall figure unchanged.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    files: HashMap<String, FileProgress>,
    files_to_load: usize,
    files_loaded: usize,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the recomputed overall percentage.
    pub fn apply(&mut self, event: &ProgressEvent) -> Option<i64> {
        match event.status {
            LoadStatus::Download => {
                if !self.files.contains_key(&event.file) {
                    self.files.insert(event.file.clone(), FileProgress::default());
                    self.files_to_load += 1;
                }
            }
            LoadStatus::Progress => {
                if let Some(percent) = event.progress {
                    self.register(&event.file).percent = percent;
                }
            }
            LoadStatus::Done => {
                let entry = self.register(&event.file);
                entry.percent = 100.0;
                let first_done = !std::mem::replace(&mut entry.done, true);
                if first_done {
                    self.files_loaded += 1;
                }
            }
            LoadStatus::Other => {}
        }

        self.overall()
    }

    fn register(&mut self, file: &str) -> &mut FileProgress {
        if !self.files.contains_key(file) {
            self.files_to_load += 1;
        }
        self.files.entry(file.to_string()).or_default()
    }

    /// Overall percentage, or `None` until at least one file is registered.
    pub fn overall(&self) -> Option<i64> {
        if self.files.is_empty() {
            return None;
        }

        let total: f64 = self.files.values().map(|f| f.percent).sum();
        let overall = (total / (self.files.len() as f64 * 100.0)) * 100.0;
        Some(overall.round() as i64)
    }

    pub fn files_registered(&self) -> usize {
        self.files_to_load
    }

    pub fn files_loaded(&self) -> usize {
        self.files_loaded
    }

    pub fn file_percent(&self, file: &str) -> Option<f64> {
        self.files.get(file).map(|f| f.percent)
    }

    pub fn is_complete(&self) -> bool {
        !self.files.is_empty() && self.files_loaded == self.files.len()
    }
}

pub fn loading_message(percent: i64) -> String {
    format!("Loading model: {}% complete", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_files_yields_none() {
        let mut aggregator = ProgressAggregator::new();
        assert_eq!(aggregator.overall(), None);

        let event = ProgressEvent {
            status: LoadStatus::Other,
            file: "config.json".to_string(),
            progress: None,
        };
        assert_eq!(aggregator.apply(&event), None);
        assert_eq!(aggregator.files_registered(), 0);
    }

    #[test]
    fn test_converges_to_one_hundred() {
        let mut aggregator = ProgressAggregator::new();
        let files = ["config.json", "tokenizer.json", "model.onnx"];

        for file in files {
            aggregator.apply(&ProgressEvent::download(file));
        }
        assert_eq!(aggregator.overall(), Some(0));

        aggregator.apply(&ProgressEvent::progress("model.onnx", 50.0));
        assert_eq!(aggregator.overall(), Some(17));

        aggregator.apply(&ProgressEvent::done("config.json"));
        aggregator.apply(&ProgressEvent::progress("tokenizer.json", 30.0));
        assert_eq!(aggregator.overall(), Some(60));

        for file in files {
            aggregator.apply(&ProgressEvent::done(file));
        }
        assert_eq!(aggregator.overall(), Some(100));
        assert_eq!(aggregator.files_loaded(), 3);
        assert!(aggregator.is_complete());
    }

    #[test]
    fn test_done_without_progress_counts_full() {
        let mut aggregator = ProgressAggregator::new();
        aggregator.apply(&ProgressEvent::download("a.bin"));
        aggregator.apply(&ProgressEvent::download("b.bin"));

        assert_eq!(aggregator.apply(&ProgressEvent::done("a.bin")), Some(50));
        assert_eq!(aggregator.file_percent("a.bin"), Some(100.0));
    }

    #[test]
    fn test_repeated_download_registers_once() {
        let mut aggregator = ProgressAggregator::new();
        aggregator.apply(&ProgressEvent::download("a.bin"));
        aggregator.apply(&ProgressEvent::progress("a.bin", 40.0));
        aggregator.apply(&ProgressEvent::download("a.bin"));

        assert_eq!(aggregator.files_registered(), 1);
        assert_eq!(aggregator.file_percent("a.bin"), Some(40.0));
    }

    #[test]
    fn test_repeated_done_counts_once() {
        let mut aggregator = ProgressAggregator::new();
        aggregator.apply(&ProgressEvent::done("a.bin"));
        aggregator.apply(&ProgressEvent::done("a.bin"));

        assert_eq!(aggregator.files_loaded(), 1);
        assert_eq!(aggregator.files_registered(), 1);
        assert_eq!(aggregator.overall(), Some(100));
    }

    #[test]
    fn test_progress_without_value_is_ignored() {
        let mut aggregator = ProgressAggregator::new();
        aggregator.apply(&ProgressEvent::download("a.bin"));
        let event = ProgressEvent {
            status: LoadStatus::Progress,
            file: "a.bin".to_string(),
            progress: None,
        };
        assert_eq!(aggregator.apply(&event), Some(0));
    }

    #[test]
    fn test_out_of_range_values_propagate() {
        let mut aggregator = ProgressAggregator::new();
        aggregator.apply(&ProgressEvent::download("a.bin"));
        assert_eq!(
            aggregator.apply(&ProgressEvent::progress("a.bin", 150.0)),
            Some(150)
        );
        assert_eq!(
            aggregator.apply(&ProgressEvent::progress("a.bin", -20.0)),
            Some(-20)
        );
    }

    #[test]
    fn test_loading_message() {
        assert_eq!(loading_message(42), "Loading model: 42% complete");
    }
}

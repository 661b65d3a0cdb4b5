// file: src/utils/telemetry.rs
// description: named timing marks and measures for pipeline diagnostics
// reference: Production observability best practices

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Records named instants relative to its construction and derives named
/// durations between them.
#[derive(Debug)]
pub struct PerformanceRecorder {
    origin: Instant,
    marks: HashMap<String, Duration>,
    measures: IndexMap<String, Duration>,
}

impl Default for PerformanceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceRecorder {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            marks: HashMap::new(),
            measures: IndexMap::new(),
        }
    }

    /// Record the current instant under `name`, replacing any earlier mark.
    pub fn mark(&mut self, name: &str) {
        let offset = self.origin.elapsed();
        self.mark_at(name, offset);
    }

    /// Record an instant measured elsewhere, as an offset from this recorder's origin.
    pub fn mark_at(&mut self, name: &str, offset: Duration) {
        debug!("{} started at {}ms", name, offset.as_millis());
        self.marks.insert(name.to_string(), offset);
    }

    /// Store the span between two marks. Missing marks make this a no-op.
    pub fn measure(&mut self, name: &str, start_mark: &str, end_mark: &str) -> Option<Duration> {
        let (Some(start), Some(end)) = (self.marks.get(start_mark), self.marks.get(end_mark))
        else {
            debug!(
                "Skipping measure {}: mark {} or {} not recorded",
                name, start_mark, end_mark
            );
            return None;
        };

        let duration = end.saturating_sub(*start);
        self.measures.insert(name.to_string(), duration);
        info!("{}: {}ms", name, rounded_millis(duration));
        Some(duration)
    }

    pub fn duration(&self, name: &str) -> Option<Duration> {
        self.measures.get(name).copied()
    }

    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    /// Recorded measures, longest first. Equal durations keep insertion order.
    pub fn summary_lines(&self) -> impl Iterator<Item = String> + '_ {
        let mut sorted: Vec<(&String, &Duration)> = self.measures.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1));
        sorted
            .into_iter()
            .map(|(name, duration)| format!("{}: {}ms", name, rounded_millis(*duration)))
    }

    pub fn summary(&self) -> String {
        self.summary_lines().collect::<Vec<_>>().join("\n")
    }

    pub fn report(&self) -> PerformanceReport {
        let mut measures: Vec<MeasureEntry> = self
            .measures
            .iter()
            .map(|(name, duration)| MeasureEntry {
                name: name.clone(),
                duration_ms: duration.as_secs_f64() * 1000.0,
            })
            .collect();
        measures.sort_by(|a, b| b.duration_ms.total_cmp(&a.duration_ms));

        PerformanceReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            measures,
        }
    }
}

fn rounded_millis(duration: Duration) -> u64 {
    (duration.as_secs_f64() * 1000.0).round() as u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureEntry {
    pub name: String,
    pub duration_ms: f64,
}

/// Serializable snapshot of a recorder's measures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: String,
    pub measures: Vec<MeasureEntry>,
}

impl PerformanceReport {
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        debug!("Wrote performance report to {}", path.display());
        Ok(())
    }
}

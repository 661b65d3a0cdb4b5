// file: src/models/progress_event.rs
// description: per-file load events emitted by a pipeline factory
// reference: transformers-style progress callback payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Download,
    Progress,
    Done,
    /// Statuses such as `initiate` or `ready` that carry no aggregate change.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProgressEvent {
    pub status: LoadStatus,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl ProgressEvent {
    pub fn download(file: impl Into<String>) -> Self {
        Self {
            status: LoadStatus::Download,
            file: file.into(),
            progress: None,
        }
    }

    pub fn progress(file: impl Into<String>, percent: f64) -> Self {
        Self {
            status: LoadStatus::Progress,
            file: file.into(),
            progress: Some(percent),
        }
    }

    pub fn done(file: impl Into<String>) -> Self {
        Self {
            status: LoadStatus::Done,
            file: file.into(),
            progress: None,
        }
    }
}

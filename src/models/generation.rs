// file: src/models/generation.rs
// description: generation parameters and summary results exchanged with the pipeline
// reference: hosted summarization task parameters

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generation parameters handed to the pipeline verbatim.
///
/// Unknown keys survive in `extra` so backends can accept knobs this crate
/// does not model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_sample: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_beams: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_repeat_ngram_size: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_length: Some(150),
            min_length: Some(40),
            do_sample: Some(true),
            temperature: Some(0.7),
            num_beams: None,
            no_repeat_ngram_size: None,
            extra: Map::new(),
        }
    }
}

impl GenerationOptions {
    pub fn with_lengths(min_length: u32, max_length: u32) -> Self {
        Self {
            max_length: Some(max_length),
            min_length: Some(min_length),
            do_sample: None,
            temperature: None,
            num_beams: None,
            no_repeat_ngram_size: None,
            extra: Map::new(),
        }
    }
}

/// One entry of the pipeline's result list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SummaryOutput {
    pub summary_text: String,
}

impl SummaryOutput {
    pub fn new(summary_text: impl Into<String>) -> Self {
        Self {
            summary_text: summary_text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lengths_only_serialize_what_is_set() {
        let options = GenerationOptions::with_lengths(10, 50);
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({"max_length": 50, "min_length": 10}));
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let options: GenerationOptions =
            serde_json::from_value(json!({"max_length": 60, "top_k": 4})).unwrap();
        assert_eq!(options.max_length, Some(60));
        assert_eq!(options.extra.get("top_k"), Some(&json!(4)));

        let back = serde_json::to_value(&options).unwrap();
        assert_eq!(back["top_k"], json!(4));
    }

    #[test]
    fn test_summary_output_field_name() {
        let parsed: Vec<SummaryOutput> =
            serde_json::from_str(r#"[{"summary_text":"short"}]"#).unwrap();
        assert_eq!(parsed[0], SummaryOutput::new("short"));
    }
}

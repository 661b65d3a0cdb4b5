// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::models::GenerationOptions;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub model: ModelConfig,
    pub inference: InferenceConfig,
    #[serde(default)]
    pub generation: GenerationOptions,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub task: String,
    pub model_id: String,
    pub local_model_path: PathBuf,
    pub allow_remote_models: bool,
    pub remote_host: String,
    pub revision: String,
    pub files: Vec<String>,
    pub quantized: bool,
    #[serde(default)]
    pub num_threads: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPolicy {
    /// Later runs reuse the loaded handle.
    #[default]
    Reuse,
    /// One successful summarization per process; failed runs may be retried.
    SingleShot,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub run_policy: RunPolicy,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("POPUP_SUMMARIZER")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            model: ModelConfig {
                task: "summarization".to_string(),
                model_id: "bart-large-cnn".to_string(),
                local_model_path: PathBuf::from("./models"),
                allow_remote_models: false,
                remote_host: "https://huggingface.co".to_string(),
                revision: "main".to_string(),
                files: vec![
                    "config.json".to_string(),
                    "tokenizer.json".to_string(),
                    "tokenizer_config.json".to_string(),
                    "generation_config.json".to_string(),
                ],
                quantized: true,
                num_threads: None,
            },
            inference: InferenceConfig {
                endpoint: "https://api-inference.huggingface.co/models".to_string(),
                api_token: None,
            },
            generation: GenerationOptions::default(),
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.model_id.trim().is_empty() {
            return Err(PipelineError::Config("model_id must not be empty".to_string()));
        }

        if self.model.files.is_empty() {
            return Err(PipelineError::Config(
                "at least one model file must be listed".to_string(),
            ));
        }

        if self.model.num_threads == Some(0) {
            return Err(PipelineError::Config(
                "num_threads must be greater than 0".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (self.generation.min_length, self.generation.max_length)
            && min > max
        {
            return Err(PipelineError::Config(format!(
                "min_length ({}) exceeds max_length ({})",
                min, max
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.run_policy, RunPolicy::Reuse);
    }

    #[test]
    fn test_rejects_inverted_lengths() {
        let mut config = Config::default_config();
        config.generation = GenerationOptions::with_lengths(80, 20);
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[model]
task = "summarization"
model_id = "distilbart-cnn-6-6"
local_model_path = "/tmp/models"
allow_remote_models = true
remote_host = "https://huggingface.co"
revision = "main"
files = ["config.json"]
quantized = false

[inference]
endpoint = "http://localhost:8080/models"

[generation]
max_length = 60
min_length = 5

[pipeline]
run_policy = "single_shot"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.model.model_id, "distilbart-cnn-6-6");
        assert!(config.model.allow_remote_models);
        assert_eq!(config.generation.max_length, Some(60));
        assert_eq!(config.pipeline.run_policy, RunPolicy::SingleShot);
        assert_eq!(config.inference.api_token, None);
    }
}

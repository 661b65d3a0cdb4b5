// file: src/utils/validation.rs
// description: input and configuration validation helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use crate::models::GenerationOptions;
use std::path::{Component, Path};

pub struct Validator;

impl Validator {
    pub fn validate_input_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Input text is empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_generation_options(options: &GenerationOptions) -> Result<()> {
        if options.max_length == Some(0) {
            return Err(PipelineError::Validation(
                "max_length must be greater than 0".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (options.min_length, options.max_length)
            && min > max
        {
            return Err(PipelineError::Validation(format!(
                "min_length ({}) exceeds max_length ({})",
                min, max
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Model asset names must stay inside the model directory.
    pub fn validate_asset_name(name: &str) -> Result<()> {
        let path = Path::new(name);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if name.trim().is_empty() || escapes {
            return Err(PipelineError::Validation(format!(
                "Invalid model asset name: {}",
                name
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((idx, _)) => format!("{}...", &text[..idx]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_input_text() {
        assert!(Validator::validate_input_text("Deep learning is powerful.").is_ok());
        assert!(Validator::validate_input_text("").is_err());
        assert!(Validator::validate_input_text(" \n\t ").is_err());
    }

    #[test]
    fn test_validate_generation_options() {
        assert!(Validator::validate_generation_options(&GenerationOptions::default()).is_ok());
        assert!(
            Validator::validate_generation_options(&GenerationOptions::with_lengths(10, 50))
                .is_ok()
        );
        assert!(
            Validator::validate_generation_options(&GenerationOptions::with_lengths(60, 50))
                .is_err()
        );
        assert!(
            Validator::validate_generation_options(&GenerationOptions::with_lengths(0, 0))
                .is_err()
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://huggingface.co").is_ok());
        assert!(Validator::validate_url("http://localhost:8080").is_ok());
        assert!(Validator::validate_url("huggingface.co").is_err());
    }

    #[test]
    fn test_validate_asset_name() {
        assert!(Validator::validate_asset_name("config.json").is_ok());
        assert!(Validator::validate_asset_name("onnx/encoder_model_quantized.onnx").is_ok());
        assert!(Validator::validate_asset_name("../secrets.json").is_err());
        assert!(Validator::validate_asset_name("/etc/passwd").is_err());
        assert!(Validator::validate_asset_name("").is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("héllo wörld", 4), "héll...");
    }
}

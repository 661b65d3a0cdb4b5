// file: src/backend/hub.rs
// description: pipeline factory resolving model assets locally or from a model hub, with hosted inference
// reference: https://huggingface.co/docs/api-inference

use crate::config::{Config, InferenceConfig, ModelConfig};
use crate::error::{PipelineError, Result};
use crate::models::{GenerationOptions, ProgressEvent, SummaryOutput};
use crate::pipeline::{PipelineFactory, PipelineHandle, PipelineRequest, ProgressSender};
use crate::utils::Validator;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, trace, warn};

const READ_CHUNK_BYTES: usize = 64 * 1024;

pub struct HubPipelineFactory {
    model: ModelConfig,
    inference: InferenceConfig,
    client: Client,
}

impl HubPipelineFactory {
    pub fn new(config: &Config) -> Result<Self> {
        Validator::validate_url(&config.inference.endpoint)?;
        if config.model.allow_remote_models {
            Validator::validate_url(&config.model.remote_host)?;
        }
        for file in &config.model.files {
            Validator::validate_asset_name(file)?;
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            inference: config.inference.clone(),
            client,
        })
    }

    fn model_dir(&self, model_id: &str) -> PathBuf {
        self.model.local_model_path.join(model_id)
    }

    fn remote_url(&self, model_id: &str, file: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.model.remote_host.trim_end_matches('/'),
            model_id,
            self.model.revision,
            file
        )
    }

    async fn fetch_asset(
        &self,
        model_id: &str,
        file: &str,
        progress: &ProgressSender,
    ) -> Result<u64> {
        let path = self.model_dir(model_id).join(file);
        emit(progress, ProgressEvent::download(file));

        let bytes = if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            read_local(&path, file, progress).await?
        } else if self.model.allow_remote_models {
            let url = self.remote_url(model_id, file);
            self.download(&url, &path, file, progress).await?
        } else {
            return Err(PipelineError::Initialization(format!(
                "model file not found: {} (remote models are disabled)",
                path.display()
            )));
        };

        emit(progress, ProgressEvent::done(file));
        Ok(bytes)
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        file: &str,
        progress: &ProgressSender,
    ) -> Result<u64> {
        debug!("Downloading {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::Initialization(format!(
                "failed to fetch {}: HTTP {}",
                file,
                response.status()
            )));
        }

        let total = response.content_length().unwrap_or(0);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        stream_into(response.bytes_stream(), dest, file, total, progress).await
    }
}

/// Stream into `<dest>.part`, then move it into place. A failed transfer
/// removes the partial file.
async fn stream_into<S, B, E>(
    stream: S,
    dest: &Path,
    file: &str,
    total: u64,
    progress: &ProgressSender,
) -> Result<u64>
where
    S: futures::Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    PipelineError: From<E>,
{
    let mut partial = dest.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    match write_stream(stream, &partial, file, total, progress).await {
        Ok(written) => {
            fs::rename(&partial, dest).await?;
            Ok(written)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial).await {
                warn!("Failed to remove {}: {}", partial.display(), cleanup);
            }
            Err(e)
        }
    }
}

/// Copy `stream` into `path`, reporting progress against `total` bytes.
async fn write_stream<S, B, E>(
    stream: S,
    path: &Path,
    file: &str,
    total: u64,
    progress: &ProgressSender,
) -> Result<u64>
where
    S: futures::Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    PipelineError: From<E>,
{
    let mut stream = std::pin::pin!(stream);
    let mut out = fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        out.write_all(bytes).await?;
        written += bytes.len() as u64;
        if total > 0 {
            emit(progress, ProgressEvent::progress(file, percent(written, total)));
        }
    }

    out.flush().await?;
    Ok(written)
}

async fn read_local(path: &Path, file: &str, progress: &ProgressSender) -> Result<u64> {
    let total = fs::metadata(path).await?.len();
    let mut handle = fs::File::open(path).await?;
    let mut buffer = vec![0u8; READ_CHUNK_BYTES];
    let mut read: u64 = 0;

    loop {
        let n = handle.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        read += n as u64;
        if total > 0 {
            emit(progress, ProgressEvent::progress(file, percent(read, total)));
        }
    }

    Ok(read)
}

fn percent(done: u64, total: u64) -> f64 {
    (done as f64 / total as f64) * 100.0
}

fn emit(progress: &ProgressSender, event: ProgressEvent) {
    if progress.send(event).is_err() {
        trace!("Progress receiver dropped; event discarded");
    }
}

#[async_trait]
impl PipelineFactory for HubPipelineFactory {
    async fn create(
        &self,
        request: &PipelineRequest,
        progress: ProgressSender,
    ) -> Result<Arc<dyn PipelineHandle>> {
        debug!(
            "Resolving {} assets (quantized: {}, threads: {:?})",
            request.model_id, request.quantized, request.num_threads
        );

        let mut total_bytes = 0;
        for file in &self.model.files {
            total_bytes += self.fetch_asset(&request.model_id, file, &progress).await?;
        }

        info!(
            "Resolved {} model files for {} ({} bytes)",
            self.model.files.len(),
            request.model_id,
            total_bytes
        );

        Ok(Arc::new(HubPipelineHandle {
            client: self.client.clone(),
            url: format!(
                "{}/{}",
                self.inference.endpoint.trim_end_matches('/'),
                request.model_id
            ),
            api_token: self.inference.api_token.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

#[derive(Debug, Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationOptions,
}

pub struct HubPipelineHandle {
    client: Client,
    url: String,
    api_token: Option<String>,
    closed: AtomicBool,
}

#[async_trait]
impl PipelineHandle for HubPipelineHandle {
    async fn invoke(&self, text: &str, options: &GenerationOptions) -> Result<Vec<SummaryOutput>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PipelineError::Invocation(
                "pipeline has been disposed".to_string(),
            ));
        }

        debug!("Requesting summary for {} chars from {}", text.len(), self.url);

        let mut request = self.client.post(&self.url).json(&SummarizationRequest {
            inputs: text,
            parameters: options,
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Invocation(format!("inference request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Invocation(format!(
                "inference endpoint returned {}: {}",
                status, body
            )));
        }

        response.json::<Vec<SummaryOutput>>().await.map_err(|e| {
            PipelineError::Invocation(format!("failed to parse inference response: {}", e))
        })
    }

    async fn dispose(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::Disposal(
                "pipeline already disposed".to_string(),
            ));
        }
        debug!("Closed pipeline handle for {}", self.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoadStatus;
    use crate::pipeline::{ProgressAggregator, progress_channel};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_interrupted_stream_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("model.onnx");
        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> = vec![
            Ok(vec![1u8; 16]),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ];
        let (tx, _rx) = progress_channel();

        let result = stream_into(futures::stream::iter(chunks), &dest, "model.onnx", 64, &tx).await;

        assert!(matches!(result, Err(PipelineError::Io(_))));
        assert!(!dest.exists());
        assert!(!dir.path().join("model.onnx.part").exists());
    }

    #[tokio::test]
    async fn test_stream_written_in_full() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> =
            vec![Ok(b"{\"a\":".to_vec()), Ok(b"1}".to_vec())];
        let (tx, mut rx) = progress_channel();

        let written = stream_into(futures::stream::iter(chunks), &path, "config.json", 7, &tx)
            .await
            .unwrap();

        assert_eq!(written, 7);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        assert!(!dir.path().join("config.json.part").exists());
        drop(tx);
        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = event.progress;
        }
        assert_eq!(last, Some(100.0));
    }

    fn local_config(dir: &Path, files: &[&str]) -> Config {
        let mut config = Config::default_config();
        config.model.local_model_path = dir.to_path_buf();
        config.model.model_id = "tiny-bart".to_string();
        config.model.files = files.iter().map(|f| f.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn test_local_assets_emit_progress() {
        let dir = TempDir::new().unwrap();
        let model_dir = dir.path().join("tiny-bart");
        std::fs::create_dir_all(model_dir.join("onnx")).unwrap();
        std::fs::write(model_dir.join("config.json"), "{}").unwrap();
        std::fs::write(
            model_dir.join("onnx/model.onnx"),
            vec![7u8; READ_CHUNK_BYTES * 2 + 10],
        )
        .unwrap();

        let config = local_config(dir.path(), &["config.json", "onnx/model.onnx"]);
        let factory = HubPipelineFactory::new(&config).unwrap();
        let (tx, mut rx) = progress_channel();

        factory
            .create(&PipelineRequest::from(&config.model), tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.first(), Some(&ProgressEvent::download("config.json")));
        assert_eq!(events.last(), Some(&ProgressEvent::done("onnx/model.onnx")));
        let model_progress = events
            .iter()
            .filter(|e| e.file == "onnx/model.onnx" && e.status == LoadStatus::Progress)
            .count();
        assert!(model_progress >= 3);

        let mut aggregator = ProgressAggregator::new();
        for event in &events {
            aggregator.apply(event);
        }
        assert_eq!(aggregator.overall(), Some(100));
    }

    #[tokio::test]
    async fn test_missing_asset_without_remote_fails() {
        let dir = TempDir::new().unwrap();
        let config = local_config(dir.path(), &["config.json"]);
        let factory = HubPipelineFactory::new(&config).unwrap();
        let (tx, _rx) = progress_channel();

        let err = match factory.create(&PipelineRequest::from(&config.model), tx).await {
            Ok(_) => panic!("expected missing asset to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, PipelineError::Initialization(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_rejects_escaping_asset_names() {
        let dir = TempDir::new().unwrap();
        let config = local_config(dir.path(), &["../outside.json"]);
        assert!(HubPipelineFactory::new(&config).is_err());
    }

    #[test]
    fn test_remote_url_layout() {
        let dir = TempDir::new().unwrap();
        let mut config = local_config(dir.path(), &["config.json"]);
        config.model.remote_host = "https://huggingface.co/".to_string();
        let factory = HubPipelineFactory::new(&config).unwrap();
        assert_eq!(
            factory.remote_url("facebook/bart-large-cnn", "onnx/model.onnx"),
            "https://huggingface.co/facebook/bart-large-cnn/resolve/main/onnx/model.onnx"
        );
    }

    #[tokio::test]
    async fn test_disposed_handle_refuses_work() {
        let handle = HubPipelineHandle {
            client: Client::new(),
            url: "http://127.0.0.1:9/models/tiny-bart".to_string(),
            api_token: None,
            closed: AtomicBool::new(false),
        };

        handle.dispose().await.unwrap();
        assert!(matches!(
            handle.dispose().await,
            Err(PipelineError::Disposal(_))
        ));

        let err = handle
            .invoke("text", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disposed"));
    }

    #[test]
    fn test_request_body_shape() {
        let options = GenerationOptions::with_lengths(10, 50);
        let body = serde_json::to_value(SummarizationRequest {
            inputs: "Deep learning is powerful.",
            parameters: &options,
        })
        .unwrap();
        assert_eq!(body["inputs"], "Deep learning is powerful.");
        assert_eq!(body["parameters"]["max_length"], 50);
    }
}

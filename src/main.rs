// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use popup_summarizer::host::{install_error_trap, log_join_failure, wait_for_host_signal};
use popup_summarizer::utils::logging::{format_error, format_step, format_success, format_warning};
use popup_summarizer::{
    Config, ConsoleStatusSink, GenerationOptions, HubPipelineFactory, MemorySink, RunOutcome,
    ShutdownHooks, StdoutSink, SummaryOrchestrator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const SAMPLE_TEXT: &str = "The field of artificial intelligence has seen remarkable progress in recent years. \
Deep learning models have achieved human-level performance in tasks like image recognition, \
natural language processing, and game playing. The development of transformer architectures \
in particular has revolutionized how AI processes sequential data. These advances have led \
to breakthroughs in machine translation, text generation, and conversational AI. However, \
challenges remain in areas like common sense reasoning and generalizing from limited data.";

#[derive(Parser)]
#[command(name = "popup_summarizer")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Summarize text with a locally managed summarization pipeline", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize text (built-in sample text when no input is given)
    Summarize {
        #[arg(short, long, conflicts_with = "input")]
        text: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long, value_name = "TOKENS")]
        max_length: Option<u32>,

        #[arg(long, value_name = "TOKENS")]
        min_length: Option<u32>,

        /// Write the timing report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Repeat the summarization to reuse the loaded pipeline
        #[arg(long, default_value_t = 1)]
        runs: usize,
    },

    /// Resolve the model files, then release the pipeline
    Fetch,

    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    popup_summarizer::utils::logging::init_logger(cli.color, cli.verbose);
    install_error_trap();

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Summarize {
            text,
            input,
            max_length,
            min_length,
            report,
            runs,
        } => {
            let input_text = read_input(text, input.as_deref()).await?;
            let mut options = config.generation.clone();
            if max_length.is_some() {
                options.max_length = max_length;
            }
            if min_length.is_some() {
                options.min_length = min_length;
            }
            cmd_summarize(
                &config,
                &input_text,
                &options,
                report.as_deref(),
                runs.max(1),
                cli.color,
            )
            .await?;
        }
        Commands::Fetch => {
            cmd_fetch(&config, cli.color).await?;
        }
        Commands::ShowConfig => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("Failed to render configuration")?
            );
        }
    }

    Ok(())
}

async fn read_input(text: Option<String>, input: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    if let Some(path) = input {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file {}", path.display()));
    }

    info!("No input given, summarizing the built-in sample text");
    Ok(SAMPLE_TEXT.to_string())
}

async fn cmd_summarize(
    config: &Config,
    text: &str,
    options: &GenerationOptions,
    report: Option<&Path>,
    runs: usize,
    colored: bool,
) -> Result<()> {
    let factory = Arc::new(
        HubPipelineFactory::new(config).context("Failed to configure pipeline backend")?,
    );
    let status = Arc::new(ConsoleStatusSink::new(colored));
    let summary = Arc::new(StdoutSink::new(colored));
    let orchestrator = SummaryOrchestrator::from_config(config, factory, status.clone(), summary);

    let hooks = ShutdownHooks::new();
    let lifecycle = Arc::clone(orchestrator.lifecycle());
    hooks.register("dispose pipeline", move || async move {
        lifecycle.dispose().await;
        Ok(())
    });

    let mut signal = tokio::spawn(wait_for_host_signal());
    let outcomes = hooks
        .run_scoped(async {
            tokio::select! {
                outcomes = run_repeatedly(&orchestrator, text, options, runs) => Some(outcomes),
                joined = &mut signal => {
                    if let Some(received) = log_join_failure(joined) {
                        warn!("Received {:?} signal, shutting down", received);
                    }
                    None
                }
            }
        })
        .await;
    signal.abort();
    status.finish();

    if let Some(path) = report {
        orchestrator
            .performance_report()
            .save(path)
            .await
            .context("Failed to write performance report")?;
        info!("Performance report written to {}", path.display());
    }

    let Some(outcomes) = outcomes else {
        eprintln!("{}", format_warning("Interrupted before the summary finished"));
        return Ok(());
    };

    let mut failures = 0;
    for outcome in &outcomes {
        match outcome {
            RunOutcome::Completed { .. } => {}
            RunOutcome::Failed { message } => {
                failures += 1;
                eprintln!("{}", format_error(message));
            }
            RunOutcome::Rejected => {
                eprintln!("{}", format_warning("Run skipped: pipeline busy or already used"));
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} summarization run(s) failed", failures, outcomes.len());
    }

    eprintln!(
        "{}",
        format_success(&format!("Completed {} summarization run(s)", outcomes.len()))
    );
    Ok(())
}

async fn run_repeatedly(
    orchestrator: &SummaryOrchestrator,
    text: &str,
    options: &GenerationOptions,
    runs: usize,
) -> Vec<RunOutcome> {
    let mut outcomes = Vec::with_capacity(runs);
    for run in 1..=runs {
        if runs > 1 {
            info!("{}", format_step(run, runs, "Summarizing"));
        }
        outcomes.push(orchestrator.run(text, options).await);
    }
    outcomes
}

async fn cmd_fetch(config: &Config, colored: bool) -> Result<()> {
    let factory = Arc::new(
        HubPipelineFactory::new(config).context("Failed to configure pipeline backend")?,
    );
    let status = Arc::new(ConsoleStatusSink::new(colored));
    let orchestrator = SummaryOrchestrator::from_config(
        config,
        factory,
        status.clone(),
        Arc::new(MemorySink::new()),
    );

    let result = orchestrator.prepare().await;
    status.finish();
    orchestrator.lifecycle().dispose().await;

    result.context("Failed to load the pipeline")?;
    info!("Timings:\n{}", orchestrator.performance_summary());
    eprintln!(
        "{}",
        format_success(&format!(
            "Model {} is available ({} files)",
            config.model.model_id,
            config.model.files.len()
        ))
    );
    Ok(())
}

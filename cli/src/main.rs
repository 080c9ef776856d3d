//! CLI entrypoint for tool-dispatch
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use dispatch_application::Dispatcher;
use dispatch_infrastructure::{ConfigLoader, EngineBuilder, Severity};
use dispatch_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber.
///
/// The returned guard must live until exit so the file writer flushes.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

/// Best-effort tool name for the spinner; the dispatcher does the real parsing.
fn peek_tool_name(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v["function"]["name"].as_str().map(str::to_string))
        .unwrap_or_else(|| "tool call".to_string())
}

async fn dispatch_one(
    dispatcher: &Dispatcher,
    raw: &str,
    output: OutputFormat,
    progress: &ProgressReporter,
) {
    progress.on_call_start(&peek_tool_name(raw));
    let envelope = dispatcher.resolve_json(raw).await;
    progress.on_call_complete(envelope.is_success());

    let rendered = match output {
        OutputFormat::Json => ConsoleFormatter::format_json(&envelope),
        OutputFormat::Pretty => ConsoleFormatter::format(&envelope),
    };
    println!("{}", rendered);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    for issue in config.validate() {
        match issue.severity {
            Severity::Warning => warn!("{}", issue.message),
            Severity::Error => error!("{}", issue.message),
        }
    }

    if let Some(dir) = &cli.workspace
        && !dir.is_dir()
    {
        bail!("Workspace {} is not a directory", dir.display());
    }

    // === Dependency Injection ===
    let builder = EngineBuilder::from_config(&config, cli.workspace.clone());
    if !builder.workspace_root().is_dir() {
        bail!(
            "Workspace {} is not a directory",
            builder.workspace_root().display()
        );
    }
    info!(workspace = %builder.workspace_root().display(), "Starting tool-dispatch");
    let dispatcher = builder.build();

    let progress = if cli.quiet {
        ProgressReporter::hidden()
    } else {
        ProgressReporter::new(true)
    };

    if let Some(raw) = cli.single_call() {
        dispatch_one(&dispatcher, &raw, cli.output, &progress).await;
        return Ok(());
    }

    // One call per line; each completes before the next is read.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        dispatch_one(&dispatcher, line, cli.output, &progress).await;
    }

    Ok(())
}

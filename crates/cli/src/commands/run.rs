//! `run` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, BufReader, BufWriter};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{LinePipeline, PipelineStats};

/// Execute the `run` command
pub async fn run_fork(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(capacity) = args.channel_capacity {
        info!(capacity, "Overriding channel capacity from CLI");
        blueprint.fork.channel_capacity = capacity.max(1);
    }

    info!(
        fork = %blueprint.fork.name,
        batches = blueprint.batches.len(),
        branches = blueprint.branch_count(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)
            .context("Failed to start metrics exporter")?;
    }

    let pipeline = LinePipeline::new(blueprint, args.label);
    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = execute(&pipeline, args.input.as_deref()) => {
            let stats = result.context("Fork run failed")?;
            info!(
                lines_read = stats.lines_read,
                lines_written = stats.lines_written,
                branch_errors = stats.branch_errors,
                duration_secs = stats.duration.as_secs_f64(),
                "Fork completed"
            );
            if args.stats {
                stats.print_summary();
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping fork...");
        }
    }

    Ok(())
}

async fn execute(pipeline: &LinePipeline, input: Option<&Path>) -> Result<PipelineStats> {
    let stdout = BufWriter::new(tokio::io::stdout());

    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| CliError::input_open(path, e))?;
            info!(input = %path.display(), "Reading input file");
            run_with(pipeline, BufReader::new(file), stdout).await
        }
        None => {
            info!("Reading input from stdin");
            run_with(pipeline, BufReader::new(tokio::io::stdin()), stdout).await
        }
    }
}

async fn run_with<R>(
    pipeline: &LinePipeline,
    input: R,
    output: BufWriter<tokio::io::Stdout>,
) -> Result<PipelineStats>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let stats = pipeline.run(input, output).await?;
    if stats.branch_errors > 0 {
        stats.print_summary();
        return Err(CliError::run(format!("{} branch errors", stats.branch_errors)).into());
    }
    Ok(stats)
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::ForkBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Fork: {}", blueprint.fork.name);
    println!("  Channel capacity: {}", blueprint.fork.channel_capacity);
    println!("  Merge capacity: {}", blueprint.fork.merge_capacity);

    for (index, batch) in blueprint.batches.iter().enumerate() {
        if index > 0 {
            println!("  -- join --");
        }
        println!("\nBatch {} ({} branches):", index + 1, batch.branches.len());
        for branch in &batch.branches {
            match &branch.arg {
                Some(arg) => println!(
                    "  - {} ({:?} {:?}, {:?})",
                    branch.name, branch.op, arg, branch.mode
                ),
                None => println!("  - {} ({:?}, {:?})", branch.name, branch.op, branch.mode),
            }
        }
    }

    println!();
}

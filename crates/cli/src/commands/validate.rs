//! `validate` command implementation.

use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    name: String,
    batch_count: usize,
    branch_count: usize,
    channel_capacity: usize,
    merge_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    name: blueprint.fork.name.clone(),
                    batch_count: blueprint.batches.len(),
                    branch_count: blueprint.branch_count(),
                    channel_capacity: blueprint.fork.channel_capacity,
                    merge_capacity: blueprint.fork.merge_capacity,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::ForkBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for (index, batch) in blueprint.batches.iter().enumerate() {
        if batch.branches.is_empty() {
            warnings.push(format!(
                "Batch {} has no branches - its join barrier has no effect",
                index + 1
            ));
        }

        let mut seen = HashSet::new();
        for branch in &batch.branches {
            if !seen.insert((branch.op, branch.arg.as_deref())) {
                warnings.push(format!(
                    "Branch '{}' repeats an operation already present in batch {}",
                    branch.name,
                    index + 1
                ));
            }
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Fork: {}", summary.name);
            println!("  Batches: {}", summary.batch_count);
            println!("  Branches: {}", summary.branch_count);
            println!("  Channel capacity: {}", summary.channel_capacity);
            println!("  Merge capacity: {}", summary.merge_capacity);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

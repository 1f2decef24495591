//! LinePipeline - runs a blueprint over a line stream

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ForkBlueprint, Writer};
use flow::Source;
use fork::Fork;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use super::branches::branch_participant;
use super::stats::PipelineStats;

/// Runs every configured branch over an input and writes the merged lines
pub struct LinePipeline {
    blueprint: ForkBlueprint,
    label: bool,
}

impl LinePipeline {
    pub fn new(blueprint: ForkBlueprint, label: bool) -> Self {
        Self { blueprint, label }
    }

    /// Build the fork with one participant per branch and a join between
    /// consecutive batches
    fn build_fork(&self) -> Fork<String, String> {
        let capacity = self.blueprint.fork.channel_capacity;
        let mut fork = Fork::with_config(self.blueprint.fork.clone());

        for (index, batch) in self.blueprint.batches.iter().enumerate() {
            if index > 0 {
                fork.join();
            }
            fork.add_all(
                batch
                    .branches
                    .iter()
                    .map(|branch| branch_participant(branch, self.label, capacity)),
            );
        }
        fork
    }

    /// Run to completion: read `input` until EOF, write merged lines to `output`
    #[instrument(name = "line_pipeline", skip_all, fields(fork = %self.blueprint.fork.name))]
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let (tx, source) = Source::channel("input", self.blueprint.fork.channel_capacity);

        let mut fork = self.build_fork();
        source.pipe(&mut fork);
        let mut merged = fork.output();
        // Closing the fork lets the merged output end once every branch is done
        let fork_stats = fork.close();

        info!(
            branches = self.blueprint.branch_count(),
            batches = fork_stats.batches_flushed,
            "Fork started"
        );

        let reader = tokio::spawn(feed_lines(input, tx));

        let mut lines_written: u64 = 0;
        let mut branch_errors: u64 = 0;
        while let Some(item) = merged.recv().await {
            match item {
                Ok(line) => {
                    output.write_all(line.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    lines_written += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Branch error");
                    branch_errors += 1;
                }
            }
        }
        output.flush().await?;

        let lines_read = reader
            .await
            .context("Input reader task failed")?
            .context("Failed to read input")?;

        Ok(PipelineStats {
            lines_read,
            lines_written,
            branch_errors,
            participants_started: fork_stats.participants_started,
            batches: fork_stats.batches_flushed,
            lines_dropped: source.metrics().dropped,
            duration: started.elapsed(),
        })
    }
}

async fn feed_lines<R>(input: R, tx: Writer<String>) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut count: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if tx.send(line).await.is_err() {
            debug!("Source closed, stopping input");
            break;
        }
        count += 1;
    }

    debug!(lines = count, "Input finished");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use std::io::Cursor;

    fn blueprint(toml: &str) -> ForkBlueprint {
        ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap()
    }

    async fn run(bp: ForkBlueprint, label: bool, input: &str) -> (Vec<String>, PipelineStats) {
        let mut out = Vec::new();
        let stats = LinePipeline::new(bp, label)
            .run(Cursor::new(input.as_bytes().to_vec()), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        (text.lines().map(str::to_string).collect(), stats)
    }

    #[tokio::test]
    async fn test_batches_are_ordered_by_join() {
        let bp = blueprint(
            r#"
[[batches]]
[[batches.branches]]
name = "upper"
op = "upper"

[[batches]]
[[batches.branches]]
name = "length"
op = "length"
mode = "callback"
"#,
        );

        let (lines, stats) = run(bp, false, "ab\ncde\n").await;
        assert_eq!(lines, vec!["AB", "CDE", "2", "3"]);
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.lines_written, 4);
        assert_eq!(stats.participants_started, 2);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.branch_errors, 0);
    }

    #[tokio::test]
    async fn test_same_batch_branches_all_emit() {
        let bp = blueprint(
            r#"
[[batches]]
[[batches.branches]]
name = "keep"
op = "grep"
arg = "a"

[[batches.branches]]
name = "rev"
op = "reverse"
"#,
        );

        let (mut lines, stats) = run(bp, true, "abc\nxyz\n").await;
        lines.sort();
        assert_eq!(lines, vec!["[keep] abc", "[rev] cba", "[rev] zyx"]);
        assert_eq!(stats.batches, 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let bp = blueprint(
            r#"
[[batches]]
[[batches.branches]]
name = "id"
op = "identity"
"#,
        );

        let (lines, stats) = run(bp, false, "").await;
        assert!(lines.is_empty());
        assert_eq!(stats.lines_read, 0);
    }
}

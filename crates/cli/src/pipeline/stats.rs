//! Run statistics.

use std::time::Duration;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Lines read from the input
    pub lines_read: u64,

    /// Lines written to the output
    pub lines_written: u64,

    /// Errors emitted by branches
    pub branch_errors: u64,

    /// Participants started by the fork
    pub participants_started: u64,

    /// Batches added to the merge sink
    pub batches: u64,

    /// Input lines that reached the source while it had no taps
    pub lines_dropped: u64,

    /// Total duration of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// Lines read per second
    pub fn lines_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.lines_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print summary to stderr; stdout carries the merged output
    pub fn print_summary(&self) {
        eprintln!("\n=== Fork Statistics ===\n");
        eprintln!("  Duration:             {:.3}s", self.duration.as_secs_f64());
        eprintln!("  Lines read:           {}", self.lines_read);
        eprintln!("  Lines written:        {}", self.lines_written);
        eprintln!("  Lines/sec:            {:.2}", self.lines_per_sec());
        eprintln!("  Participants started: {}", self.participants_started);
        eprintln!("  Batches:              {}", self.batches);
        if self.lines_dropped > 0 {
            eprintln!("  Lines dropped:        {}", self.lines_dropped);
        }
        if self.branch_errors > 0 {
            eprintln!("  Branch errors:        {}", self.branch_errors);
        }
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_per_sec() {
        let stats = PipelineStats {
            lines_read: 10,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.lines_per_sec() - 5.0).abs() < f64::EPSILON);
        assert_eq!(PipelineStats::default().lines_per_sec(), 0.0);
    }
}

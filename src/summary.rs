//! Batch outcome counters

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::dispatch::FileOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub sidecar: PathBuf,
    pub error: String,
}

/// Counts of what a run did, plus the reason for every failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub failures: Vec<Failure>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Updated { .. } => self.succeeded += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { sidecar, error } => {
                self.failed += 1;
                self.failures.push(Failure {
                    sidecar: sidecar.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.skipped + self.failed
    }

    /// No file failed. Skips do not count against a run.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sidecars: {} updated, {} skipped, {} failed",
            self.total(),
            self.succeeded,
            self.skipped,
            self.failed
        )
    }
}

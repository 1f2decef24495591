//! ForkBlueprint - Config Loader output
//!
//! Describes a line-oriented fork: fork settings plus batches of branches.
//! Consecutive batches are separated by a join barrier.

use serde::{Deserialize, Serialize};

use crate::ForkConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete fork blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Fork settings
    #[serde(default)]
    pub fork: ForkConfig,

    /// Branch batches, in join order
    pub batches: Vec<BatchConfig>,
}

impl ForkBlueprint {
    /// Iterate every branch across all batches
    pub fn branches(&self) -> impl Iterator<Item = &BranchConfig> {
        self.batches.iter().flat_map(|b| b.branches.iter())
    }

    /// Total number of branches
    pub fn branch_count(&self) -> usize {
        self.branches().count()
    }
}

/// One batch: branches started together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Branches in insertion order
    #[serde(default)]
    pub branches: Vec<BranchConfig>,
}

/// One branch of the fork
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Unique branch name
    pub name: String,

    /// Line operation
    pub op: BranchOp,

    /// Operation argument (`prefix`, `grep`)
    #[serde(default)]
    pub arg: Option<String>,

    /// How the branch attaches to the source
    #[serde(default)]
    pub mode: BranchMode,
}

/// Per-line operation of a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchOp {
    /// Pass lines through unchanged
    Identity,
    /// Uppercase
    Upper,
    /// Lowercase
    Lower,
    /// Reverse characters
    Reverse,
    /// Prepend `arg`
    Prefix,
    /// Keep lines containing `arg`
    Grep,
    /// Replace each line by its character count
    Length,
}

impl BranchOp {
    /// Whether the operation needs `arg`
    pub fn requires_arg(self) -> bool {
        matches!(self, Self::Prefix | Self::Grep)
    }
}

/// Participant shape used for a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchMode {
    /// Source piped into a transform stage
    #[default]
    Stage,
    /// Callback invoked with the source
    Callback,
}

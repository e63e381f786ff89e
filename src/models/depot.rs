//! Depot (hosted repository) DTOs.
//!
//! - `Depot`: a repository with its default branch and local branches
//! - `DepotSummary`: id and name only (repository picker options)
//! - `BranchInfo`: single branch with its tip commit (branch picker options)
//! - `CommitInfo`: basic commit info

use serde::{Deserialize, Serialize};

pub type DepotId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitInfo {
    pub oid: String,
    pub message: String,
    pub author: String,
    pub timestamp: i64,
    pub relative_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub last_commit: Option<CommitInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Depot {
    pub id: DepotId,
    pub name: String,
    /// HEAD's symbolic target; may name a branch that does not exist yet.
    pub default_branch: Option<String>,
    /// Local branches sorted by name.
    pub branches: Vec<BranchInfo>,
}

impl Depot {
    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.iter().any(|b| b.name == name)
    }

    /// The branch a dependent selection falls back to: the default branch when
    /// it exists, otherwise the first branch, otherwise nothing.
    pub fn fallback_branch(&self) -> Option<&str> {
        match self.default_branch.as_deref() {
            Some(name) if self.has_branch(name) => Some(name),
            _ => self.branches.first().map(|b| b.name.as_str()),
        }
    }

    pub fn summary(&self) -> DepotSummary {
        DepotSummary {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepotSummary {
    pub id: DepotId,
    pub name: String,
}

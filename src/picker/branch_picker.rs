//! Downstream control: chooses a branch of the currently selected depot.
//!
//! The stored choice may be stale or absent (a fresh depot, a deleted
//! branch). Reads always normalize it against the depot's current branch
//! set, falling back to the default branch, then to the first branch. A
//! depot without branches renders disabled with nothing selected.

use crate::error::Result;
use crate::git::DepotStore;
use crate::models::{BranchPickerView, Depot};
use crate::picker::selection::{Detachable, EntityRef};

#[derive(Debug)]
pub struct BranchPicker {
    markup_id: String,
    generation: u64,
    depot: EntityRef<Depot>,
    selected: Option<String>,
}

impl BranchPicker {
    pub fn new(
        markup_id: impl Into<String>,
        generation: u64,
        depot: EntityRef<Depot>,
        selected: Option<String>,
    ) -> Self {
        Self {
            markup_id: markup_id.into(),
            generation,
            depot,
            selected,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The effective selection for the depot as it is now.
    pub fn selected(&mut self, store: &dyn DepotStore) -> Result<Option<String>> {
        let depot = self.depot.resolve(store)?;
        Ok(normalize(&depot, self.selected.as_deref()))
    }

    /// Apply a user choice. Returns whether the effective selection changed.
    ///
    /// A branch the depot does not have is replaced by the fallback branch.
    pub fn select(&mut self, store: &dyn DepotStore, branch: &str) -> Result<bool> {
        let depot = self.depot.resolve(store)?;
        let current = normalize(&depot, self.selected.as_deref());

        let chosen = if depot.has_branch(branch) {
            Some(branch.to_string())
        } else {
            tracing::warn!(
                "Branch {} is not in repository {}, using its default",
                branch,
                depot.id
            );
            depot.fallback_branch().map(str::to_string)
        };

        self.selected = chosen.clone();
        Ok(chosen != current)
    }

    pub fn render(&mut self, store: &dyn DepotStore) -> Result<BranchPickerView> {
        let depot = self.depot.resolve(store)?;
        let selected = normalize(&depot, self.selected.as_deref());
        Ok(BranchPickerView {
            markup_id: self.markup_id.clone(),
            generation: self.generation,
            options: depot.branches.clone(),
            selected,
            disabled: depot.branches.is_empty(),
        })
    }
}

impl Detachable for BranchPicker {
    fn detach(&mut self) {
        self.depot.detach();
    }
}

fn normalize(depot: &Depot, candidate: Option<&str>) -> Option<String> {
    match candidate {
        Some(branch) if depot.has_branch(branch) => Some(branch.to_string()),
        _ => depot.fallback_branch().map(str::to_string),
    }
}

//! Upstream control: chooses a depot among the depots affinal to the one the
//! panel was opened on.

use crate::error::{AppError, Result};
use crate::git::DepotStore;
use crate::models::{DepotId, DepotSummary, RepositoryPickerView};
use crate::picker::selection::{affinal_ref, Detachable, EntityRef};

#[derive(Debug)]
pub struct RepositoryPicker {
    markup_id: String,
    options: EntityRef<Vec<DepotSummary>>,
    selected: DepotId,
}

impl RepositoryPicker {
    pub fn new(markup_id: impl Into<String>, affinal_to: &str, selected: &str) -> Self {
        Self {
            markup_id: markup_id.into(),
            options: affinal_ref(affinal_to),
            selected: selected.to_string(),
        }
    }

    /// Check that `repo_id` is one of the offered depots.
    pub fn validate(&mut self, store: &dyn DepotStore, repo_id: &str) -> Result<()> {
        let options = self.options.resolve(store)?;
        if options.iter().any(|o| o.id == repo_id) {
            Ok(())
        } else {
            Err(AppError::InvalidSelection(format!(
                "repository {} is not offered by {}",
                repo_id, self.markup_id
            )))
        }
    }

    /// Select `repo_id` and offer the depots affinal to it from now on, so
    /// the options no longer depend on the depot the panel was opened on.
    pub fn rebind(&mut self, repo_id: &str) {
        self.options.detach();
        self.options = affinal_ref(repo_id);
        self.selected = repo_id.to_string();
    }

    pub fn render(&mut self, store: &dyn DepotStore) -> Result<RepositoryPickerView> {
        let options = self.options.resolve(store)?;
        Ok(RepositoryPickerView {
            markup_id: self.markup_id.clone(),
            options: options.as_ref().clone(),
            selected: self.selected.clone(),
        })
    }
}

impl Detachable for RepositoryPicker {
    fn detach(&mut self) {
        self.options.detach();
    }
}

//! `AffinalBranchPicker`: a repository picker and a branch picker kept in
//! step with each other.
//!
//! Choosing another depot resets the branch to that depot's default,
//! discards the branch picker and builds a new one bound to the new depot,
//! then reports the combined selection to the listener. A depot that can no
//! longer be resolved renders as an empty placeholder instead of failing.

use std::fmt;
use std::sync::Arc;

use crate::assets;
use crate::error::{AppError, Result};
use crate::git::DepotStore;
use crate::models::{ComponentView, Depot, DepotId, PanelView};
use crate::picker::selection::{depot_ref, Detachable, EntityRef};
use crate::picker::{BranchPicker, BranchSelectionListener, RepositoryPicker, UpdateTarget};

const STYLESHEET: &str = "css/branch-picker.css";

enum PanelState {
    Uninitialized,
    Initialized {
        repository_picker: RepositoryPicker,
        branch_picker: BranchPicker,
    },
}

pub struct AffinalBranchPicker {
    markup_id: String,
    repo: EntityRef<Depot>,
    branch: Option<String>,
    state: PanelState,
    output_markup_id: bool,
    listener: Box<dyn BranchSelectionListener>,
}

impl AffinalBranchPicker {
    pub fn new(
        markup_id: impl Into<String>,
        repo_id: impl Into<DepotId>,
        branch: Option<String>,
        listener: impl BranchSelectionListener + 'static,
    ) -> Self {
        Self {
            markup_id: markup_id.into(),
            repo: depot_ref(repo_id),
            branch,
            state: PanelState::Uninitialized,
            output_markup_id: false,
            listener: Box::new(listener),
        }
    }

    pub fn markup_id(&self) -> &str {
        &self.markup_id
    }

    pub fn repo_id(&self) -> &str {
        self.repo.id()
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, PanelState::Initialized { .. })
    }

    /// Whether partial updates may target this panel by its markup id.
    pub fn outputs_markup_id(&self) -> bool {
        self.output_markup_id
    }

    /// Build both child pickers. Nothing is resolved here; a second call is a
    /// no-op.
    pub fn initialize(&mut self) {
        if self.is_initialized() {
            return;
        }

        let repo_id = self.repo.id().to_string();
        let repository_picker =
            RepositoryPicker::new(self.child_id("repositoryPicker"), &repo_id, &repo_id);
        let branch_picker = self.new_branch_picker(0);

        self.state = PanelState::Initialized {
            repository_picker,
            branch_picker,
        };
        self.output_markup_id = true;
        tracing::debug!("Initialized branch picker panel {} on {}", self.markup_id, repo_id);
    }

    /// Render the whole panel. Vanished depots yield `PanelView::Empty`; any
    /// other failure propagates.
    pub fn render(&mut self, store: &dyn DepotStore) -> Result<PanelView> {
        match self.render_ready(store) {
            Err(err) if err.is_not_found() => {
                tracing::info!("Branch picker {} shows empty state: {}", self.markup_id, err);
                Ok(PanelView::Empty {
                    markup_id: self.markup_id.clone(),
                    reason: err.to_string(),
                })
            }
            other => other,
        }
    }

    fn render_ready(&mut self, store: &dyn DepotStore) -> Result<PanelView> {
        let markup_id = self.markup_id.clone();
        let (repository_picker, branch_picker) = self.children_mut()?;
        Ok(PanelView::Ready {
            markup_id,
            stylesheet: assets::asset_url(STYLESHEET),
            repository_picker: repository_picker.render(store)?,
            branch_picker: branch_picker.render(store)?,
        })
    }

    /// Current combined selection, or `None` when the depot is gone.
    pub fn selection(&mut self, store: &dyn DepotStore) -> Result<Option<(Arc<Depot>, Option<String>)>> {
        let depot = match self.repo.resolve(store) {
            Ok(depot) => depot,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };
        let (_, branch_picker) = self.children_mut()?;
        let branch = branch_picker.selected(store)?;
        Ok(Some((depot, branch)))
    }

    /// Handle a choice in the repository picker.
    ///
    /// Choosing the current depot changes nothing. A depot that is not on
    /// offer or no longer exists leaves the selection as it was and
    /// re-renders the panel so the client sees the current options.
    pub fn select_repository(
        &mut self,
        store: &dyn DepotStore,
        target: &mut UpdateTarget,
        repo_id: &str,
    ) -> Result<()> {
        if repo_id == self.repo.id() {
            return Ok(());
        }

        match self.switch_repository(store, repo_id) {
            Ok(depot) => {
                let generation = self.branch_picker_generation()? + 1;
                self.replace_branch_picker(store, target, generation)?;

                let (repository_picker, _) = self.children_mut()?;
                target.add(ComponentView::RepositoryPicker(repository_picker.render(store)?));

                self.listener.on_select(target, &depot, self.branch.as_deref());
                Ok(())
            }
            Err(err @ (AppError::NotFound { .. } | AppError::InvalidSelection(_))) => {
                tracing::warn!("Ignoring repository selection {}: {}", repo_id, err);
                let (repository_picker, _) = self.children_mut()?;
                repository_picker.detach();
                let view = self.render(store)?;
                target.add(ComponentView::Panel(view));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn switch_repository(&mut self, store: &dyn DepotStore, repo_id: &str) -> Result<Arc<Depot>> {
        let (repository_picker, _) = self.children_mut()?;
        repository_picker.validate(store, repo_id)?;

        let mut next = depot_ref(repo_id);
        let depot = next.resolve(store)?;

        let (repository_picker, _) = self.children_mut()?;
        repository_picker.rebind(repo_id);
        self.repo = next;
        self.branch = depot.fallback_branch().map(str::to_string);
        Ok(depot)
    }

    /// Handle a choice in the branch picker.
    pub fn select_branch(
        &mut self,
        store: &dyn DepotStore,
        target: &mut UpdateTarget,
        branch: &str,
    ) -> Result<()> {
        let (_, branch_picker) = self.children_mut()?;
        let changed = match branch_picker.select(store, branch) {
            Ok(changed) => changed,
            Err(err) if err.is_not_found() => {
                let view = self.render(store)?;
                target.add(ComponentView::Panel(view));
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        if !changed {
            return Ok(());
        }

        let selected = branch_picker.selected(store)?;
        target.add(ComponentView::BranchPicker(branch_picker.render(store)?));
        self.branch = selected;

        let depot = self.repo.resolve(store)?;
        self.listener.on_select(target, &depot, self.branch.as_deref());
        Ok(())
    }

    /// Tear the panel down. Consumes it so no further interaction is possible.
    pub fn dispose(mut self) {
        self.detach();
        tracing::debug!("Disposed branch picker panel {}", self.markup_id);
    }

    fn child_id(&self, name: &str) -> String {
        format!("{}-{}", self.markup_id, name)
    }

    fn new_branch_picker(&self, generation: u64) -> BranchPicker {
        BranchPicker::new(
            self.child_id("branchPicker"),
            generation,
            depot_ref(self.repo.id()),
            self.branch.clone(),
        )
    }

    fn branch_picker_generation(&self) -> Result<u64> {
        match &self.state {
            PanelState::Initialized { branch_picker, .. } => Ok(branch_picker.generation()),
            PanelState::Uninitialized => Err(self.not_initialized()),
        }
    }

    /// Swap in a branch picker bound to the current depot. The old picker is
    /// detached and dropped before the new one is rendered into `target`.
    fn replace_branch_picker(
        &mut self,
        store: &dyn DepotStore,
        target: &mut UpdateTarget,
        generation: u64,
    ) -> Result<()> {
        let replacement = self.new_branch_picker(generation);
        let (_, branch_picker) = self.children_mut()?;
        branch_picker.detach();
        *branch_picker = replacement;
        target.add(ComponentView::BranchPicker(branch_picker.render(store)?));
        Ok(())
    }

    fn children_mut(&mut self) -> Result<(&mut RepositoryPicker, &mut BranchPicker)> {
        match &mut self.state {
            PanelState::Initialized {
                repository_picker,
                branch_picker,
            } => Ok((repository_picker, branch_picker)),
            PanelState::Uninitialized => Err(AppError::Internal(format!(
                "branch picker {} used before initialization",
                self.markup_id
            ))),
        }
    }

    fn not_initialized(&self) -> AppError {
        AppError::Internal(format!(
            "branch picker {} used before initialization",
            self.markup_id
        ))
    }
}

impl Detachable for AffinalBranchPicker {
    fn detach(&mut self) {
        self.repo.detach();
        if let PanelState::Initialized {
            repository_picker,
            branch_picker,
        } = &mut self.state
        {
            repository_picker.detach();
            branch_picker.detach();
        }
    }
}

impl fmt::Debug for AffinalBranchPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinalBranchPicker")
            .field("markup_id", &self.markup_id)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

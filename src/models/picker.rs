//! Picker view DTOs returned by the picker host API.
//!
//! - `PanelView`: full render of a cascading branch picker panel
//! - `RepositoryPickerView` / `BranchPickerView`: the two child controls
//! - `ComponentView`: one replaced component in a partial update
//! - `SelectionEvent`: combined (depot, branch) selection emitted to listeners
//! - `UpdateResponse`: everything a single interaction changed

use serde::{Deserialize, Serialize};

use super::{BranchInfo, DepotId, DepotSummary};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RepositoryPickerView {
    pub markup_id: String,
    pub options: Vec<DepotSummary>,
    pub selected: DepotId,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BranchPickerView {
    pub markup_id: String,
    /// Bumped every time the control is discarded and rebuilt.
    pub generation: u64,
    pub options: Vec<BranchInfo>,
    pub selected: Option<String>,
    /// Set when the depot has no branch to choose from.
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PanelView {
    Ready {
        markup_id: String,
        stylesheet: String,
        repository_picker: RepositoryPickerView,
        branch_picker: BranchPickerView,
    },
    /// Placeholder rendered when the selected depot cannot be resolved.
    Empty { markup_id: String, reason: String },
}

impl PanelView {
    pub fn markup_id(&self) -> &str {
        match self {
            PanelView::Ready { markup_id, .. } | PanelView::Empty { markup_id, .. } => markup_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PanelView::Empty { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentView {
    RepositoryPicker(RepositoryPickerView),
    BranchPicker(BranchPickerView),
    Panel(PanelView),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionEvent {
    pub depot_id: DepotId,
    pub depot_name: String,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UpdateResponse {
    pub components: Vec<ComponentView>,
    pub events: Vec<SelectionEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePickerRequest {
    pub repo_id: DepotId,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectRepositoryRequest {
    pub repo_id: DepotId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectBranchRequest {
    pub branch: String,
}

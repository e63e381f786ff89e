//! Cascading repository/branch picker.
//!
//! - `selection`: identifier-keyed, request-scoped entity references
//! - `repository_picker`: upstream control choosing a depot among its affinal depots
//! - `branch_picker`: downstream control choosing a branch of the selected depot
//! - `panel`: `AffinalBranchPicker`, composing both and keeping them consistent
//!
//! Components are driven by a host (the picker routes): `initialize` once,
//! any number of `render`/`select_*` calls, each followed by `detach`, then
//! `dispose`. Every interaction reports what it changed through an
//! `UpdateTarget`.

pub mod branch_picker;
pub mod panel;
pub mod repository_picker;
pub mod selection;

#[cfg(test)]
pub mod testutil;

pub use branch_picker::BranchPicker;
pub use panel::AffinalBranchPicker;
pub use repository_picker::RepositoryPicker;
pub use selection::in_request;

use crate::models::{ComponentView, Depot, SelectionEvent, UpdateResponse};

/// Collects the components replaced and the events raised while handling a
/// single interaction.
#[derive(Debug, Default)]
pub struct UpdateTarget {
    components: Vec<ComponentView>,
    events: Vec<SelectionEvent>,
}

impl UpdateTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a component for re-rendering on the client. A later render of
    /// the same component supersedes the earlier one.
    pub fn add(&mut self, component: ComponentView) {
        let id = markup_id_of(&component).to_string();
        self.components.retain(|c| markup_id_of(c) != id);
        self.components.push(component);
    }

    pub fn emit(&mut self, event: SelectionEvent) {
        self.events.push(event);
    }

    pub fn components(&self) -> &[ComponentView] {
        &self.components
    }

    pub fn events(&self) -> &[SelectionEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.events.is_empty()
    }

    pub fn into_response(self) -> UpdateResponse {
        UpdateResponse {
            components: self.components,
            events: self.events,
        }
    }
}

fn markup_id_of(component: &ComponentView) -> &str {
    match component {
        ComponentView::RepositoryPicker(view) => &view.markup_id,
        ComponentView::BranchPicker(view) => &view.markup_id,
        ComponentView::Panel(view) => view.markup_id(),
    }
}

/// Receives the combined (depot, branch) selection whenever either picker
/// of a panel changes.
pub trait BranchSelectionListener: Send {
    fn on_select(&mut self, target: &mut UpdateTarget, depot: &Depot, branch: Option<&str>);
}

impl<F> BranchSelectionListener for F
where
    F: FnMut(&mut UpdateTarget, &Depot, Option<&str>) + Send,
{
    fn on_select(&mut self, target: &mut UpdateTarget, depot: &Depot, branch: Option<&str>) {
        self(target, depot, branch)
    }
}

/// Listener that reports every selection back to the client as an event.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmitSelection;

impl BranchSelectionListener for EmitSelection {
    fn on_select(&mut self, target: &mut UpdateTarget, depot: &Depot, branch: Option<&str>) {
        target.emit(SelectionEvent {
            depot_id: depot.id.clone(),
            depot_name: depot.name.clone(),
            branch: branch.map(str::to_string),
        });
    }
}

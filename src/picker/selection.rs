//! Identifier-keyed entity references.
//!
//! A picker never holds a `Depot` across requests: it holds the depot id and
//! resolves it through the store on first use within a request. `detach`
//! drops the resolved value at the end of the request so the next request
//! sees the store's current state (renamed branches, deleted repositories).

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::git::DepotStore;
use crate::models::{Depot, DepotId, DepotSummary};

pub type Loader<T> = fn(&dyn DepotStore, &str) -> Result<T>;

/// Anything holding request-scoped state that must be released once the
/// current request has been handled.
pub trait Detachable {
    fn detach(&mut self);
}

pub struct EntityRef<T> {
    id: DepotId,
    loader: Loader<T>,
    cached: Option<Arc<T>>,
}

impl<T> EntityRef<T> {
    pub fn new(id: impl Into<DepotId>, loader: Loader<T>) -> Self {
        Self {
            id: id.into(),
            loader,
            cached: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolve the entity, loading it if this request has not done so yet.
    pub fn resolve(&mut self, store: &dyn DepotStore) -> Result<Arc<T>> {
        if let Some(cached) = &self.cached {
            return Ok(Arc::clone(cached));
        }
        let loaded = Arc::new((self.loader)(store, &self.id)?);
        self.cached = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn is_attached(&self) -> bool {
        self.cached.is_some()
    }
}

impl<T> Detachable for EntityRef<T> {
    fn detach(&mut self) {
        self.cached = None;
    }
}

impl<T> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

fn load_depot(store: &dyn DepotStore, id: &str) -> Result<Depot> {
    store.load(id)
}

fn load_affinal(store: &dyn DepotStore, id: &str) -> Result<Vec<DepotSummary>> {
    store.affinal(id)
}

pub fn depot_ref(id: impl Into<DepotId>) -> EntityRef<Depot> {
    EntityRef::new(id, load_depot)
}

/// Depots sharing history with `id`, used as repository picker options.
pub fn affinal_ref(id: impl Into<DepotId>) -> EntityRef<Vec<DepotSummary>> {
    EntityRef::new(id, load_affinal)
}

/// Run one request's worth of work against `component`, detaching it
/// afterwards whether or not the work succeeded.
pub fn in_request<C, R>(component: &mut C, f: impl FnOnce(&mut C) -> R) -> R
where
    C: Detachable,
{
    let result = f(component);
    component.detach();
    result
}

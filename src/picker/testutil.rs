//! In-memory depot store for picker tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{AppError, Result};
use crate::git::DepotStore;
use crate::models::{BranchInfo, Depot, DepotSummary};

#[derive(Default)]
pub struct MemoryStore {
    depots: Mutex<BTreeMap<String, Depot>>,
    /// Depot id -> family name; depots of the same family are affinal.
    families: Mutex<BTreeMap<String, String>>,
    loads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depot(self, id: &str, default_branch: Option<&str>, branches: &[&str]) -> Self {
        self.with_family_depot(id, "default", default_branch, branches)
    }

    pub fn with_family_depot(
        self,
        id: &str,
        family: &str,
        default_branch: Option<&str>,
        branches: &[&str],
    ) -> Self {
        self.set_branches(id, default_branch, branches);
        self.families
            .lock()
            .unwrap()
            .insert(id.to_string(), family.to_string());
        self
    }

    pub fn set_branches(&self, id: &str, default_branch: Option<&str>, branches: &[&str]) {
        let depot = Depot {
            id: id.to_string(),
            name: id.to_uppercase(),
            default_branch: default_branch.map(str::to_string),
            branches: branches
                .iter()
                .map(|name| BranchInfo {
                    name: name.to_string(),
                    last_commit: None,
                })
                .collect(),
        };
        self.depots.lock().unwrap().insert(id.to_string(), depot);
    }

    pub fn remove(&self, id: &str) {
        self.depots.lock().unwrap().remove(id);
    }

    /// Number of `load` calls served so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl DepotStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Depot> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.depots
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::depot_not_found(id))
    }

    fn list(&self) -> Result<Vec<DepotSummary>> {
        Ok(self.depots.lock().unwrap().values().map(Depot::summary).collect())
    }

    fn affinal(&self, id: &str) -> Result<Vec<DepotSummary>> {
        let depots = self.depots.lock().unwrap();
        let families = self.families.lock().unwrap();
        let target = depots.get(id).ok_or_else(|| AppError::depot_not_found(id))?;
        let family = families.get(id);

        let mut affinal = vec![target.summary()];
        affinal.extend(
            depots
                .values()
                .filter(|d| d.id != id && families.get(&d.id) == family)
                .map(Depot::summary),
        );
        Ok(affinal)
    }
}

//! Depot lookup over a directory of repositories.
//!
//! Every direct child of the root that libgit2 can open is a depot, keyed by
//! its directory name. Nothing is held open between calls: each lookup opens
//! the repository afresh so deleted or rewritten repositories are seen
//! immediately.
//!
//! Used by: the branch picker's entity references and the depot routes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::git::GitRepository;
use crate::models::{Depot, DepotSummary};

/// Read-only entity lookup used by the web layer.
pub trait DepotStore: Send + Sync {
    /// Load a depot; an unknown id yields `AppError::NotFound`.
    fn load(&self, id: &str) -> Result<Depot>;

    /// All depots, sorted by id.
    fn list(&self) -> Result<Vec<DepotSummary>>;

    /// The depot itself followed by every depot it shares history with.
    fn affinal(&self, id: &str) -> Result<Vec<DepotSummary>>;
}

pub type SharedStore = Arc<dyn DepotStore>;

pub struct GitDepotStore {
    root: PathBuf,
}

impl GitDepotStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self, id: &str) -> Result<GitRepository> {
        if !is_valid_id(id) {
            return Err(AppError::depot_not_found(id));
        }
        let path = self.root.join(id);
        if !path.is_dir() {
            return Err(AppError::depot_not_found(id));
        }
        GitRepository::open(&path).map_err(|e| match e {
            AppError::NotFound { .. } => AppError::depot_not_found(id),
            other => other,
        })
    }

    fn summary_of(id: &str, repo: &GitRepository) -> DepotSummary {
        let name = repo
            .path
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".git").to_string())
            .unwrap_or_else(|| id.to_string());
        DepotSummary {
            id: id.to_string(),
            name,
        }
    }
}

impl DepotStore for GitDepotStore {
    fn load(&self, id: &str) -> Result<Depot> {
        let repo = self.open(id)?;
        repo.to_depot(&id.to_string())
    }

    fn list(&self) -> Result<Vec<DepotSummary>> {
        let mut depots = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let id = entry.file_name().to_string_lossy().to_string();
            if !is_valid_id(&id) || !entry.path().is_dir() {
                continue;
            }
            match GitRepository::open(entry.path()) {
                Ok(repo) => depots.push(Self::summary_of(&id, &repo)),
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Skipping non-repository directory: {}", id)
                }
                Err(e) => {
                    tracing::error!("Repository {} cannot be opened: {}", id, e);
                    return Err(e);
                }
            }
        }

        depots.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(depots)
    }

    fn affinal(&self, id: &str) -> Result<Vec<DepotSummary>> {
        let target = self.open(id)?;
        let roots = target.root_commits()?;
        let mut affinal = vec![Self::summary_of(id, &target)];

        if roots.is_empty() {
            return Ok(affinal);
        }

        for candidate in self.list()? {
            if candidate.id == id {
                continue;
            }
            // A repository removed mid-scan is simply not affinal.
            let repo = match self.open(&candidate.id) {
                Ok(repo) => repo,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let other: HashSet<_> = repo.root_commits()?;
            if !roots.is_disjoint(&other) {
                affinal.push(candidate);
            }
        }

        Ok(affinal)
    }
}

/// Depot ids are single, visible directory names.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains('/')
        && !id.contains('\\')
}

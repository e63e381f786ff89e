use git2::{BranchType, ErrorCode, Oid, Repository, Sort};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{lock_poisoned, AppError, Result};
use crate::models::{BranchInfo, CommitInfo, Depot, DepotId};

pub struct GitRepository {
    pub repo: Mutex<Repository>,
    pub path: PathBuf,
}

impl GitRepository {
    /// Open the repository at exactly `path`. Unlike discovery this never
    /// walks up into an enclosing repository.
    ///
    /// Only a path that holds no repository is `NotFound`; a repository that
    /// exists but cannot be read (bad config, corrupt objects, permissions)
    /// is a git error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let repo = Repository::open(&path).map_err(|e| match e.code() {
            ErrorCode::NotFound => AppError::depot_not_found(path.to_string_lossy().to_string()),
            _ => AppError::Git(e),
        })?;

        Ok(Self {
            repo: Mutex::new(repo),
            path,
        })
    }

    pub fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        let repo = self.repo.lock().map_err(lock_poisoned)?;
        f(&repo)
    }

    /// Branch HEAD points at, even when that branch is unborn.
    pub fn default_branch(&self) -> Result<Option<String>> {
        self.with_repo(|repo| {
            let head = repo.find_reference("HEAD")?;
            Ok(head
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(|name| name.to_string()))
        })
    }

    pub fn list_branches(&self) -> Result<Vec<BranchInfo>> {
        self.with_repo(|repo| {
            let mut branches = Vec::new();
            for entry in repo.branches(Some(BranchType::Local))? {
                let (branch, _) = entry?;
                let Some(name) = branch.name()? else {
                    continue; // not valid UTF-8
                };
                let last_commit = branch.get().peel_to_commit().ok().map(|c| commit_to_info(&c));
                branches.push(BranchInfo {
                    name: name.to_string(),
                    last_commit,
                });
            }
            branches.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(branches)
        })
    }

    /// Parentless commits reachable from any local branch.
    pub fn root_commits(&self) -> Result<HashSet<Oid>> {
        self.with_repo(|repo| {
            let mut roots = HashSet::new();
            if repo.is_empty()? {
                return Ok(roots);
            }

            let mut revwalk = repo.revwalk()?;
            revwalk.set_sorting(Sort::TOPOLOGICAL)?;
            revwalk.push_glob("refs/heads/*")?;

            for oid in revwalk {
                let commit = repo.find_commit(oid?)?;
                if commit.parent_count() == 0 {
                    roots.insert(commit.id());
                }
            }
            Ok(roots)
        })
    }

    pub fn to_depot(&self, id: &DepotId) -> Result<Depot> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".git").to_string())
            .unwrap_or_else(|| id.clone());

        Ok(Depot {
            id: id.clone(),
            name,
            default_branch: self.default_branch()?,
            branches: self.list_branches()?,
        })
    }
}

pub fn commit_to_info(commit: &git2::Commit) -> CommitInfo {
    let timestamp = commit.time().seconds();
    CommitInfo {
        oid: commit.id().to_string(),
        message: commit.summary().unwrap_or("").trim().to_string(),
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        timestamp,
        relative_time: format_relative_time(timestamp),
    }
}

pub fn format_relative_time(timestamp: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testutil::{commit_on, init_repo};

    #[test]
    fn unborn_head_still_names_default_branch() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(&tmp.path().join("empty"), "trunk");

        let repo = GitRepository::open(tmp.path().join("empty")).unwrap();
        assert_eq!(repo.default_branch().unwrap().as_deref(), Some("trunk"));
        assert!(repo.list_branches().unwrap().is_empty());
        assert!(repo.root_commits().unwrap().is_empty());
    }

    #[test]
    fn branches_are_sorted_with_tip_commits() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = init_repo(&tmp.path().join("alpha"), "main");
        let root = commit_on(&raw, "main", "initial");
        commit_on(&raw, "dev", "feature work");

        let repo = GitRepository::open(tmp.path().join("alpha")).unwrap();
        let branches = repo.list_branches().unwrap();
        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "main"]);
        assert_eq!(
            branches[0].last_commit.as_ref().map(|c| c.message.as_str()),
            Some("feature work")
        );

        let roots = repo.root_commits().unwrap();
        assert_eq!(roots.len(), 1);
        assert!(roots.contains(&root));
    }

    #[test]
    fn open_rejects_plain_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = GitRepository::open(tmp.path()).err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn open_reports_unreadable_repository_as_git_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken");
        init_repo(&path, "main");
        std::fs::write(path.join(".git").join("config"), "[core\n").unwrap();

        let err = GitRepository::open(&path).err().unwrap();
        assert!(!err.is_not_found());
        assert!(matches!(err, AppError::Git(_)));
    }

    #[test]
    fn relative_time_buckets() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_relative_time(now), "just now");
        assert_eq!(format_relative_time(now - 120), "2 minutes ago");
        assert_eq!(format_relative_time(now - 3600), "1 hour ago");
    }
}

//! On-disk repository fixtures shared by tests.

use git2::{Oid, Repository, Signature};
use std::path::Path;

/// Create a repository whose HEAD points at the (unborn) `head` branch.
pub fn init_repo(path: &Path, head: &str) -> Repository {
    let repo = Repository::init(path).unwrap();
    repo.set_head(&format!("refs/heads/{}", head)).unwrap();
    repo
}

/// Commit an empty tree onto `branch`, creating the branch from HEAD's
/// commit when it does not exist yet.
pub fn commit_on(repo: &Repository, branch: &str, message: &str) -> Oid {
    let sig = Signature::now("Tester", "tester@example.com").unwrap();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let refname = format!("refs/heads/{}", branch);
    let parent = repo
        .find_reference(&refname)
        .or_else(|_| repo.head())
        .ok()
        .and_then(|r| r.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some(&refname), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Clone `source` as a fork under `dest`.
pub fn fork_repo(source: &Path, dest: &Path) -> Repository {
    Repository::clone(source.to_str().unwrap(), dest).unwrap()
}

use std::fmt;
use tracing::info;

use crate::error::{FailureKind, StepError};
use crate::git::{Author, VersionControl};
use crate::workspace::LocalWorkspace;

/// Message recorded on every seed commit
pub const INIT_COMMIT_MESSAGE: &str = "[Init]: Initialised Repository";

/// Identifier of a recorded commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitId(git2::Oid);

impl CommitId {
    pub fn oid(&self) -> git2::Oid {
        self.0
    }

    /// Abbreviated form for status lines
    pub fn short(&self) -> String {
        self.oid().to_string().chars().take(7).collect()
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stage the seed files that were actually written and record the seed commit
pub fn record<V: VersionControl>(
    vcs: &V,
    workspace: &LocalWorkspace,
    author: &Author,
) -> Result<CommitId, StepError> {
    vcs.stage(workspace.repo(), workspace.written_files())?;
    let id = vcs.commit(workspace.repo(), INIT_COMMIT_MESSAGE, author)?;
    if vcs.head_commit(workspace.repo())? != Some(id) {
        return Err(StepError::new(
            FailureKind::CommitError,
            format!("Commit {id} was recorded but HEAD does not point at it"),
        ));
    }
    info!(
        commit = %id,
        files = workspace.written_files().len(),
        "Commit Successful {}",
        id.short()
    );
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitManager;
    use crate::workspace;
    use tempfile::tempdir;

    fn author() -> Author {
        Author {
            name: "octo".to_string(),
            email: "octo@example.com".to_string(),
        }
    }

    #[test]
    fn test_record_returns_head() {
        let temp = tempdir().unwrap();
        let git = GitManager::new("main");
        let ws = workspace::initialize(&git, temp.path(), "demo", "*.exe\n").unwrap();
        let id = record(&git, &ws, &author()).unwrap();

        assert_eq!(git.head_commit(ws.repo()).unwrap(), Some(id));
        let commit = ws.repo().inner().find_commit(id.oid()).unwrap();
        assert!(commit.message().unwrap().starts_with("[Init]"));

        let tree = commit.tree().unwrap();
        let mut names: Vec<String> = tree
            .iter()
            .filter_map(|e| e.name().map(str::to_string))
            .collect();
        names.sort();
        assert_eq!(names, vec![".gitignore", "README.md"]);
    }

    #[test]
    fn test_readme_only_without_ignore_content() {
        let temp = tempdir().unwrap();
        let git = GitManager::new("main");
        let ws = workspace::initialize(&git, temp.path(), "demo", "").unwrap();
        let id = record(&git, &ws, &author()).unwrap();
        let tree = ws.repo().inner().find_commit(id.oid()).unwrap().tree().unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get_name("README.md").is_some());
    }

    #[test]
    fn test_short_id() {
        let oid = git2::Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
        let id = CommitId::from(oid);
        assert_eq!(id.short(), "0123456");
        assert_eq!(id.to_string().len(), 40);
    }
}

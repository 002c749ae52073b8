use git2::{
    Cred, ErrorClass, ErrorCode, PushOptions, RemoteCallbacks, Repository,
    RepositoryInitOptions, Signature,
};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::commit::CommitId;
use crate::error::{FailureKind, StepError};
use crate::session::AccessToken;

/// Handle to an initialized local store
pub struct LocalRepo {
    repo: Repository,
    root: PathBuf,
}

impl LocalRepo {
    pub fn inner(&self) -> &Repository {
        &self.repo
    }
}

impl fmt::Debug for LocalRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalRepo").field("root", &self.root).finish()
    }
}

/// Who a commit is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Basic-auth credentials for an HTTPS push
#[derive(Debug, Clone)]
pub struct PushCredentials {
    pub username: String,
    pub token: AccessToken,
}

/// Version-control operations the bootstrap needs
pub trait VersionControl {
    fn init_repository(&self, path: &Path) -> Result<LocalRepo, StepError>;

    /// Stage workdir-relative paths into the index
    fn stage(&self, repo: &LocalRepo, paths: &[PathBuf]) -> Result<(), StepError>;

    fn commit(
        &self,
        repo: &LocalRepo,
        message: &str,
        author: &Author,
    ) -> Result<CommitId, StepError>;

    fn add_remote(&self, repo: &LocalRepo, name: &str, url: &str) -> Result<(), StepError>;

    fn push(
        &self,
        repo: &LocalRepo,
        remote: &str,
        credentials: &PushCredentials,
    ) -> Result<(), StepError>;

    /// Commit HEAD points at, `None` while the branch is unborn
    fn head_commit(&self, repo: &LocalRepo) -> Result<Option<CommitId>, StepError>;
}

/// libgit2-backed version control
#[derive(Debug, Clone)]
pub struct GitManager {
    default_branch: String,
}

impl GitManager {
    /// Create a new Git manager
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            default_branch: default_branch.into(),
        }
    }

    /// Record upstream tracking for the pushed branch so later pulls need no arguments
    fn set_upstream(&self, repo: &LocalRepo, remote: &str, branch: &str) -> Result<(), git2::Error> {
        let mut config = repo.inner().config()?;
        config.set_str(&format!("branch.{branch}.remote"), remote)?;
        config.set_str(&format!("branch.{branch}.merge"), &format!("refs/heads/{branch}"))?;
        Ok(())
    }
}

impl VersionControl for GitManager {
    fn init_repository(&self, path: &Path) -> Result<LocalRepo, StepError> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(&self.default_branch);
        let repo = Repository::init_opts(path, &opts).map_err(|e| {
            StepError::new(
                FailureKind::StoreInitError,
                format!("Failed to initialize Git repository at '{}': {}", path.display(), e.message()),
            )
        })?;
        info!("Git repository initialized at: {}", path.display());
        Ok(LocalRepo {
            repo,
            root: path.to_path_buf(),
        })
    }

    fn stage(&self, repo: &LocalRepo, paths: &[PathBuf]) -> Result<(), StepError> {
        let stage_err = |e: git2::Error| {
            StepError::new(FailureKind::StageError, format!("Not able to git add: {}", e.message()))
        };
        let mut index = repo.repo.index().map_err(stage_err)?;
        for path in paths {
            if !repo.root.join(path).is_file() {
                return Err(StepError::new(
                    FailureKind::StageError,
                    format!("Not able to git add '{}': file does not exist", path.display()),
                ));
            }
            index.add_path(path).map_err(stage_err)?;
            debug!("Staged {}", path.display());
        }
        index.write().map_err(stage_err)?;
        Ok(())
    }

    fn commit(
        &self,
        repo: &LocalRepo,
        message: &str,
        author: &Author,
    ) -> Result<CommitId, StepError> {
        let commit_err = |e: git2::Error| {
            StepError::new(FailureKind::CommitError, format!("Commit error: {}", e.message()))
        };
        let signature = Signature::now(&author.name, &author.email).map_err(commit_err)?;
        let mut index = repo.repo.index().map_err(commit_err)?;
        let tree_id = index.write_tree().map_err(commit_err)?;
        let tree = repo.repo.find_tree(tree_id).map_err(commit_err)?;

        let parent = match repo.repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(commit_err)?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(commit_err)?;
        debug!("Created commit: {oid}");
        Ok(CommitId::from(oid))
    }

    fn add_remote(&self, repo: &LocalRepo, name: &str, url: &str) -> Result<(), StepError> {
        let existing = repo.repo.remotes().map_err(|e| {
            StepError::new(FailureKind::InvalidInput, format!("Failed to list remotes: {}", e.message()))
        })?;
        if let Some(other) = existing.iter().flatten().next() {
            return Err(StepError::new(
                FailureKind::RemoteAlreadyConfigured,
                format!("Remote '{other}' is already configured"),
            ));
        }
        repo.repo.remote(name, url).map_err(|e| {
            let kind = if e.code() == ErrorCode::Exists {
                FailureKind::RemoteAlreadyConfigured
            } else {
                FailureKind::InvalidInput
            };
            StepError::new(kind, format!("Failed to add remote '{name}': {}", e.message()))
        })?;
        info!("Remote '{name}' added: {url}");
        Ok(())
    }

    fn push(
        &self,
        repo: &LocalRepo,
        remote: &str,
        credentials: &PushCredentials,
    ) -> Result<(), StepError> {
        let head = repo.repo.head().map_err(|e| StepError::from_push(&e))?;
        let branch = head.shorthand().unwrap_or(&self.default_branch).to_string();
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");

        let mut remote_handle = repo
            .repo
            .find_remote(remote)
            .map_err(|e| StepError::from_push(&e))?;

        let attempts = Cell::new(0u32);
        let rejected: RefCell<Option<String>> = RefCell::new(None);
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|_url, _username, _allowed| {
                // libgit2 asks again after a rejected answer; one try is all we have
                if attempts.get() > 0 {
                    return Err(git2::Error::new(
                        ErrorCode::Auth,
                        ErrorClass::Http,
                        "authentication rejected by remote",
                    ));
                }
                attempts.set(attempts.get() + 1);
                Cred::userpass_plaintext(&credentials.username, credentials.token.expose())
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(reason) = status {
                    *rejected.borrow_mut() = Some(format!("{refname}: {reason}"));
                }
                Ok(())
            });

            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote_handle
                .push(&[refspec.as_str()], Some(&mut opts))
                .map_err(|e| StepError::from_push(&e))?;
        }

        if let Some(reason) = rejected.into_inner() {
            return Err(StepError::new(
                FailureKind::RejectedByRemote,
                format!("Push rejected by remote: {reason}"),
            ));
        }

        if let Err(e) = self.set_upstream(repo, remote, &branch) {
            warn!("Pushed, but could not record upstream for '{branch}': {e}");
        }
        info!("Pushed {branch} to {remote}");
        Ok(())
    }

    fn head_commit(&self, repo: &LocalRepo) -> Result<Option<CommitId>, StepError> {
        match repo.repo.head() {
            Ok(head) => Ok(head.target().map(CommitId::from)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(StepError::new(
                FailureKind::CommitError,
                format!("Failed to read HEAD: {}", e.message()),
            )),
        }
    }
}

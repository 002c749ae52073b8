use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use url::Url;

use crate::commit::CommitId;
use crate::error::{FailureKind, StepError};
use crate::workspace::LocalWorkspace;

/// Repository visibility on the hosting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn from_private(private: bool) -> Self {
        if private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("Public"),
            Visibility::Private => f.write_str("Private"),
        }
    }
}

/// Ignore-file templates offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreTemplate {
    Node,
    Android,
    Java,
    Python,
    Go,
    Rails,
    /// Do not write an ignore file
    #[default]
    None,
}

impl IgnoreTemplate {
    pub const ALL: [IgnoreTemplate; 7] = [
        IgnoreTemplate::Node,
        IgnoreTemplate::Android,
        IgnoreTemplate::Java,
        IgnoreTemplate::Python,
        IgnoreTemplate::Go,
        IgnoreTemplate::Rails,
        IgnoreTemplate::None,
    ];

    /// Name as published in the hosting service's template catalog
    pub fn catalog_name(self) -> Option<&'static str> {
        match self {
            IgnoreTemplate::Node => Some("Node"),
            IgnoreTemplate::Android => Some("Android"),
            IgnoreTemplate::Java => Some("Java"),
            IgnoreTemplate::Python => Some("Python"),
            IgnoreTemplate::Go => Some("Go"),
            IgnoreTemplate::Rails => Some("Rails"),
            IgnoreTemplate::None => None,
        }
    }
}

impl fmt::Display for IgnoreTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name().unwrap_or("None"))
    }
}

/// Bearer token for the hosting service. Never printed.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRequest {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub ignore_template: IgnoreTemplate,
}

impl RepoRequest {
    pub fn new(
        name: &str,
        description: Option<&str>,
        visibility: Visibility,
        ignore_template: IgnoreTemplate,
    ) -> Result<Self, StepError> {
        let name = name.trim();
        validate_repo_name(name)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            name: name.to_string(),
            description,
            visibility,
            ignore_template,
        })
    }
}

/// The name doubles as a local directory name, so it must be a single path component
pub fn validate_repo_name(name: &str) -> Result<(), StepError> {
    if name.is_empty() {
        return Err(StepError::new(
            FailureKind::InvalidInput,
            "Repository name cannot be empty",
        ));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StepError::new(
            FailureKind::InvalidInput,
            format!("Repository name '{name}' is not a valid directory name"),
        ));
    }
    Ok(())
}

/// Identity and location of the newly created remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    pub full_name: String,
    pub owner_login: String,
    pub owner_email: String,
    pub clone_url: Url,
    pub html_url: Option<String>,
}

/// State carried through one bootstrap run.
///
/// Each resolved slot is written exactly once, by the step that produces it.
#[derive(Debug)]
pub struct Session {
    token: AccessToken,
    request: RepoRequest,
    remote: OnceCell<RemoteRepo>,
    workspace: OnceCell<LocalWorkspace>,
    commit: OnceCell<CommitId>,
}

impl Session {
    pub fn new(token: AccessToken, request: RepoRequest) -> Self {
        Self {
            token,
            request,
            remote: OnceCell::new(),
            workspace: OnceCell::new(),
            commit: OnceCell::new(),
        }
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn request(&self) -> &RepoRequest {
        &self.request
    }

    pub fn remote(&self) -> Option<&RemoteRepo> {
        self.remote.get()
    }

    pub fn workspace(&self) -> Option<&LocalWorkspace> {
        self.workspace.get()
    }

    pub fn commit(&self) -> Option<&CommitId> {
        self.commit.get()
    }

    pub(crate) fn set_remote(&self, remote: RemoteRepo) -> Result<&RemoteRepo, StepError> {
        self.remote
            .set(remote)
            .map_err(|_| already_written("remote repository"))?;
        self.remote.get().ok_or_else(|| already_written("remote repository"))
    }

    pub(crate) fn set_workspace(
        &self,
        workspace: LocalWorkspace,
    ) -> Result<&LocalWorkspace, StepError> {
        self.workspace
            .set(workspace)
            .map_err(|_| already_written("local workspace"))?;
        self.workspace.get().ok_or_else(|| already_written("local workspace"))
    }

    pub(crate) fn set_commit(&self, commit: CommitId) -> Result<&CommitId, StepError> {
        self.commit
            .set(commit)
            .map_err(|_| already_written("seed commit"))?;
        self.commit.get().ok_or_else(|| already_written("seed commit"))
    }
}

fn already_written(field: &str) -> StepError {
    StepError::new(
        FailureKind::InvalidInput,
        format!("Session {field} was already resolved by an earlier step"),
    )
}

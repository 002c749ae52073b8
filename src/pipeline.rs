use std::fmt;
use std::path::PathBuf;
use tracing::{info, info_span, warn};

use crate::commit;
use crate::error::{ExitCategory, StepError};
use crate::git::{Author, VersionControl};
use crate::github::HostingApi;
use crate::publish;
use crate::remote;
use crate::session::Session;
use crate::template;
use crate::workspace;

/// Result of one bootstrap step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    /// The step failed but produced a usable fallback; the run continues
    Recoverable { value: T, reason: StepError },
    /// The run stops here
    Fatal(StepError),
}

impl<T> From<Result<T, StepError>> for Outcome<T> {
    fn from(result: Result<T, StepError>) -> Self {
        match result {
            Ok(value) => Outcome::Done(value),
            Err(e) => Outcome::Fatal(e),
        }
    }
}

/// Steps of a bootstrap run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateRemote,
    FetchTemplate,
    InitializeWorkspace,
    RecordCommit,
    Publish,
}

impl Stage {
    pub fn exit_category(self) -> ExitCategory {
        match self {
            Stage::CreateRemote => ExitCategory::RemoteCreation,
            // FetchTemplate is never fatal; it sits with the local steps
            Stage::FetchTemplate | Stage::InitializeWorkspace | Stage::RecordCommit => {
                ExitCategory::Commit
            }
            Stage::Publish => ExitCategory::Push,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::CreateRemote => "Creating the repo",
            Stage::FetchTemplate => "Fetching the ignore template",
            Stage::InitializeWorkspace => "Initializing the local repository",
            Stage::RecordCommit => "Recording the initial commit",
            Stage::Publish => "Pushing the commit",
        };
        f.write_str(label)
    }
}

/// Progress hooks for presentation. Observers never influence the run.
pub trait StepObserver {
    fn on_start(&self, _stage: Stage) {}
    fn on_success(&self, _stage: Stage, _detail: &str) {}
    fn on_warning(&self, _stage: Stage, _reason: &StepError) {}
    fn on_failure(&self, _stage: Stage, _reason: &StepError) {}
}

pub struct SilentObserver;

impl StepObserver for SilentObserver {}

/// Terminal status of a run, with the session as it stood when the run ended
#[derive(Debug)]
pub struct BootstrapReport {
    pub session: Session,
    pub failure: Option<(Stage, StepError)>,
    pub warnings: Vec<(Stage, StepError)>,
}

impl BootstrapReport {
    pub fn exit_category(&self) -> ExitCategory {
        match &self.failure {
            None => ExitCategory::Success,
            Some((stage, _)) => stage.exit_category(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_category().code()
    }
}

/// Runs create remote → fetch template → initialize → commit → publish.
///
/// Stops at the first fatal failure and undoes nothing: a created remote or a recorded
/// commit stays where it is for the user to inspect.
pub struct Bootstrapper<'a, H: HostingApi + ?Sized, V: VersionControl> {
    host: &'a H,
    vcs: &'a V,
    parent_dir: PathBuf,
    remote_name: String,
    observer: &'a dyn StepObserver,
}

impl<'a, H: HostingApi + ?Sized, V: VersionControl> Bootstrapper<'a, H, V> {
    pub fn new(host: &'a H, vcs: &'a V, parent_dir: PathBuf) -> Self {
        Self {
            host,
            vcs,
            parent_dir,
            remote_name: "origin".to_string(),
            observer: &SilentObserver,
        }
    }

    pub fn with_remote_name(mut self, remote_name: impl Into<String>) -> Self {
        self.remote_name = remote_name.into();
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn StepObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn run(&self, session: Session) -> BootstrapReport {
        let mut warnings = Vec::new();
        let failure = self.execute(&session, &mut warnings).err();
        match &failure {
            None => info!(repo = %session.request().name, "Bootstrap completed"),
            Some((stage, e)) => info!(stage = ?stage, kind = ?e.kind, "Bootstrap aborted: {e}"),
        }
        BootstrapReport {
            session,
            failure,
            warnings,
        }
    }

    fn execute(
        &self,
        session: &Session,
        warnings: &mut Vec<(Stage, StepError)>,
    ) -> Result<(), (Stage, StepError)> {
        let request = session.request();

        let created = self.step(
            Stage::CreateRemote,
            warnings,
            || Outcome::from(remote::create(self.host, session.token(), request)),
            |r| format!("Successfully created new repo {}", r.full_name),
        )?;
        let remote = session
            .set_remote(created)
            .map_err(|e| (Stage::CreateRemote, e))?;

        let ignore_content = self.step(
            Stage::FetchTemplate,
            warnings,
            || template::fetch(self.host, request.ignore_template),
            |text: &String| {
                if text.is_empty() {
                    "No ignore file".to_string()
                } else {
                    format!("Fetched the {} ignore template", request.ignore_template)
                }
            },
        )?;

        let initialized = self.step(
            Stage::InitializeWorkspace,
            warnings,
            || {
                Outcome::from(workspace::initialize(
                    self.vcs,
                    &self.parent_dir,
                    &request.name,
                    &ignore_content,
                ))
            },
            |ws| format!("Initialized {}", ws.path().display()),
        )?;
        let local = session
            .set_workspace(initialized)
            .map_err(|e| (Stage::InitializeWorkspace, e))?;

        let author = Author {
            name: remote.owner_login.clone(),
            email: remote.owner_email.clone(),
        };
        let id = self.step(
            Stage::RecordCommit,
            warnings,
            || Outcome::from(commit::record(self.vcs, local, &author)),
            |id| format!("Commit Successful {}", id.short()),
        )?;
        session.set_commit(id).map_err(|e| (Stage::RecordCommit, e))?;

        self.step(
            Stage::Publish,
            warnings,
            || {
                Outcome::from(publish::publish(
                    self.vcs,
                    local,
                    &remote.clone_url,
                    &remote.owner_login,
                    session.token(),
                    &self.remote_name,
                ))
            },
            |_| "Pushed successfully".to_string(),
        )?;

        Ok(())
    }

    fn step<T>(
        &self,
        stage: Stage,
        warnings: &mut Vec<(Stage, StepError)>,
        run: impl FnOnce() -> Outcome<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Result<T, (Stage, StepError)> {
        let span = info_span!("step", stage = ?stage);
        let _enter = span.enter();
        self.observer.on_start(stage);
        match run() {
            Outcome::Done(value) => {
                self.observer.on_success(stage, &describe(&value));
                Ok(value)
            }
            Outcome::Recoverable { value, reason } => {
                warn!(kind = ?reason.kind, "Continuing after: {reason}");
                self.observer.on_warning(stage, &reason);
                warnings.push((stage, reason));
                Ok(value)
            }
            Outcome::Fatal(reason) => {
                self.observer.on_failure(stage, &reason);
                Err((stage, reason))
            }
        }
    }
}

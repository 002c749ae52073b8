use std::fmt;
use thiserror::Error;

/// Categories of failure a bootstrap step can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The hosting service refused the token
    AuthRejected,
    /// A repository with this name already exists remotely
    NameConflict,
    /// The request never got a usable answer
    NetworkError,
    /// The hosting service answered with a non-success status
    ServiceError,
    DirectoryExists,
    PermissionDenied,
    /// The version-control store could not be created
    StoreInitError,
    StageError,
    CommitError,
    RemoteAlreadyConfigured,
    /// The remote refused the pushed reference
    RejectedByRemote,
    InvalidInput,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::AuthRejected => "authentication rejected",
            FailureKind::NameConflict => "name conflict",
            FailureKind::NetworkError => "network error",
            FailureKind::ServiceError => "service error",
            FailureKind::DirectoryExists => "directory exists",
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::StoreInitError => "store initialization failed",
            FailureKind::StageError => "staging failed",
            FailureKind::CommitError => "commit failed",
            FailureKind::RemoteAlreadyConfigured => "remote already configured",
            FailureKind::RejectedByRemote => "rejected by remote",
            FailureKind::InvalidInput => "invalid input",
        };
        f.write_str(name)
    }
}

/// A failed step: what went wrong and the message shown to the user verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StepError {
    pub kind: FailureKind,
    pub message: String,
}

impl StepError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a transport-level reqwest failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        Self::new(
            FailureKind::NetworkError,
            format!("Could not reach the hosting service: {err}"),
        )
    }

    /// Classify a non-success HTTP answer from the hosting service
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = api_message(body).unwrap_or_else(|| body.trim().to_string());
        match status {
            401 | 403 => Self::new(
                FailureKind::AuthRejected,
                format!("Access token rejected (HTTP {status}): {detail}"),
            ),
            422 if body.contains("already exists") => Self::new(
                FailureKind::NameConflict,
                format!("Repository already exists: {detail}"),
            ),
            _ => Self::new(
                FailureKind::ServiceError,
                format!("Hosting service returned HTTP {status}: {detail}"),
            ),
        }
    }

    /// Classify a filesystem failure while creating the workspace directory
    pub fn from_io(err: &std::io::Error, path: &std::path::Path) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::AlreadyExists => FailureKind::DirectoryExists,
            // Anything else (read-only fs, missing parent) means we may not create here
            _ => FailureKind::PermissionDenied,
        };
        Self::new(
            kind,
            format!("Failed to create directory '{}': {err}", path.display()),
        )
    }

    /// Classify a libgit2 failure raised while pushing
    pub fn from_push(err: &git2::Error) -> Self {
        let message = format!("Push failed: {}", err.message());
        let auth = err.code() == git2::ErrorCode::Auth
            || err.message().contains("401")
            || err.message().contains("authentication");
        let kind = if auth {
            FailureKind::AuthRejected
        } else {
            match err.class() {
                git2::ErrorClass::Net
                | git2::ErrorClass::Http
                | git2::ErrorClass::Ssl
                | git2::ErrorClass::Os => FailureKind::NetworkError,
                // Per-ref refusals arrive through the push callbacks, not as errors
                _ => FailureKind::ServiceError,
            }
        };
        Self::new(kind, message)
    }
}

/// Pull the `message` field out of a GitHub-style JSON error body
fn api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let mut message = value.get("message")?.as_str()?.to_string();
    if let Some(errors) = value.get("errors").and_then(|e| e.as_array()) {
        for entry in errors {
            if let Some(extra) = entry.get("message").and_then(|m| m.as_str()) {
                message.push_str(": ");
                message.push_str(extra);
            }
        }
    }
    Some(message)
}

/// Process exit code categories observed by the invoking shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCategory {
    Success,
    Usage,
    RemoteCreation,
    Commit,
    Push,
    Interrupted,
}

impl ExitCategory {
    pub fn code(self) -> i32 {
        match self {
            ExitCategory::Success => 0,
            ExitCategory::Usage => 1,
            ExitCategory::RemoteCreation => 2,
            ExitCategory::Commit => 3,
            ExitCategory::Push => 4,
            ExitCategory::Interrupted => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(StepError::from_status(401, "").kind, FailureKind::AuthRejected);
        assert_eq!(StepError::from_status(403, "").kind, FailureKind::AuthRejected);
        assert_eq!(StepError::from_status(500, "oops").kind, FailureKind::ServiceError);
        assert_eq!(
            StepError::from_status(422, "Validation Failed").kind,
            FailureKind::ServiceError
        );
    }

    #[test]
    fn test_name_conflict_uses_api_message() {
        let body = r#"{"message":"Repository creation failed.","errors":[{"resource":"Repository","code":"custom","field":"name","message":"name already exists on this account"}]}"#;
        let err = StepError::from_status(422, body);
        assert_eq!(err.kind, FailureKind::NameConflict);
        assert!(err.message.contains("name already exists on this account"));
        assert!(err.message.contains("Repository creation failed."));
    }

    #[test]
    fn test_io_classification() {
        let path = std::path::Path::new("demo");
        let exists = std::io::Error::from(std::io::ErrorKind::AlreadyExists);
        assert_eq!(StepError::from_io(&exists, path).kind, FailureKind::DirectoryExists);
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(StepError::from_io(&denied, path).kind, FailureKind::PermissionDenied);
    }

    #[test]
    fn test_push_auth_classification() {
        let err = git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication required",
        );
        assert_eq!(StepError::from_push(&err).kind, FailureKind::AuthRejected);
        let net = git2::Error::new(git2::ErrorCode::GenericError, git2::ErrorClass::Net, "reset");
        assert_eq!(StepError::from_push(&net).kind, FailureKind::NetworkError);
    }

    #[test]
    fn test_push_local_errors_are_not_remote_rejections() {
        for class in [git2::ErrorClass::Reference, git2::ErrorClass::Repository] {
            let err = git2::Error::new(git2::ErrorCode::NotFound, class, "could not find repository");
            assert_eq!(StepError::from_push(&err).kind, FailureKind::ServiceError);
        }
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ExitCategory::RemoteCreation.code(),
            ExitCategory::Commit.code(),
            ExitCategory::Push.code(),
        ];
        assert_eq!(ExitCategory::Success.code(), 0);
        assert!(codes.iter().all(|c| *c != 0));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
    }
}

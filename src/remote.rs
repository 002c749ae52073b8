use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FailureKind, StepError};
use crate::github::HostingApi;
use crate::session::{AccessToken, RepoRequest, RemoteRepo};

/// Create the hosted repository and resolve the identity that owns it
pub fn create<H: HostingApi + ?Sized>(
    host: &H,
    token: &AccessToken,
    request: &RepoRequest,
) -> Result<RemoteRepo, StepError> {
    info!(
        repo = %request.name,
        visibility = %request.visibility,
        "Creating remote repository"
    );
    let descriptor = host.create_repository(token, request)?;
    if descriptor.name != request.name {
        warn!(
            "Hosting service renamed '{}' to '{}'; the local directory keeps the requested name",
            request.name, descriptor.name
        );
    }

    let login = descriptor.owner.login.trim().to_string();
    if login.is_empty() {
        return Err(StepError::new(
            FailureKind::ServiceError,
            "Hosting service did not report a repository owner",
        ));
    }

    let clone_url = parse_clone_url(&descriptor.clone_url)?;
    let profile = host.get_user(token, &login)?;
    debug!(
        login = %login,
        display_name = profile.name.as_deref().unwrap_or(""),
        "Resolved repository owner"
    );
    let owner_email = match profile.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => {
            warn!("No public email for '{login}', using the no-reply address");
            noreply_email(&login)
        }
    };

    info!("Created repository {}", descriptor.full_name);
    Ok(RemoteRepo {
        full_name: descriptor.full_name,
        owner_login: login,
        owner_email,
        clone_url,
        html_url: descriptor.html_url,
    })
}

pub fn noreply_email(login: &str) -> String {
    format!("{login}@users.noreply.github.com")
}

/// Pushes authenticate with the token over HTTPS, so SSH-style URLs are refused
fn parse_clone_url(raw: &str) -> Result<Url, StepError> {
    let url = Url::parse(raw).map_err(|e| {
        StepError::new(
            FailureKind::ServiceError,
            format!("Hosting service returned an invalid clone URL '{raw}': {e}"),
        )
    })?;
    match url.scheme() {
        "https" | "http" | "file" => Ok(url),
        other => Err(StepError::new(
            FailureKind::ServiceError,
            format!("Clone URL scheme '{other}' cannot be used with token authentication"),
        )),
    }
}

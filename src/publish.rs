use tracing::info;
use url::Url;

use crate::error::StepError;
use crate::git::{PushCredentials, VersionControl};
use crate::session::AccessToken;
use crate::workspace::LocalWorkspace;

/// Register `clone_url` as the only remote and push the seed commit to it
pub fn publish<V: VersionControl>(
    vcs: &V,
    workspace: &LocalWorkspace,
    clone_url: &Url,
    username: &str,
    token: &AccessToken,
    remote_name: &str,
) -> Result<(), StepError> {
    vcs.add_remote(workspace.repo(), remote_name, clone_url.as_str())?;
    info!("Pushing the commit to {clone_url}");
    let credentials = PushCredentials {
        username: username.to_string(),
        token: token.clone(),
    };
    vcs.push(workspace.repo(), remote_name, &credentials)?;
    info!("Pushed successfully");
    Ok(())
}

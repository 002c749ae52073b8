use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::GitHubConfig;
use crate::error::{FailureKind, StepError};
use crate::session::{AccessToken, RepoRequest};

/// Repository as described by the hosting service after creation
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RepoDescriptor {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    pub owner: RepoOwner,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IgnoreTemplateResponse {
    source: String,
}

#[derive(Debug, Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    private: bool,
}

/// Calls the bootstrap makes against the hosting service
pub trait HostingApi {
    fn create_repository(
        &self,
        token: &AccessToken,
        request: &RepoRequest,
    ) -> Result<RepoDescriptor, StepError>;

    fn get_user(&self, token: &AccessToken, login: &str) -> Result<UserProfile, StepError>;

    /// Raw ignore-file text for a catalog template
    fn get_ignore_template(&self, name: &str) -> Result<String, StepError>;
}

/// REST client for GitHub
pub struct GitHubClient {
    client: Client,
    api_url: String,
    user_agent: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<T, StepError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| StepError::from_transport(&e))?;
        if !status.is_success() {
            return Err(StepError::from_status(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| {
            StepError::new(
                FailureKind::ServiceError,
                format!("Unexpected response from hosting service: {e}"),
            )
        })
    }
}

impl HostingApi for GitHubClient {
    fn create_repository(
        &self,
        token: &AccessToken,
        request: &RepoRequest,
    ) -> Result<RepoDescriptor, StepError> {
        let body = CreateRepoBody {
            name: &request.name,
            description: request.description.as_deref(),
            private: request.visibility.is_private(),
        };
        debug!("POST {}", self.endpoint("user/repos"));
        let response = self
            .client
            .post(self.endpoint("user/repos"))
            .bearer_auth(token.expose())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .map_err(|e| StepError::from_transport(&e))?;
        self.read_json(response)
    }

    fn get_user(&self, token: &AccessToken, login: &str) -> Result<UserProfile, StepError> {
        let url = self.endpoint(&format!("users/{login}"));
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(|e| StepError::from_transport(&e))?;
        self.read_json(response)
    }

    fn get_ignore_template(&self, name: &str) -> Result<String, StepError> {
        let url = self.endpoint(&format!("gitignore/templates/{name}"));
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(|e| StepError::from_transport(&e))?;
        let template: IgnoreTemplateResponse = self.read_json(response)?;
        Ok(template.source)
    }
}

/// Offline stand-in for the hosting service used when `GINIT_TEST_MODE=1`.
///
/// Repositories are bare stores under `root`, so pushes go through the real git path.
pub struct SimulatedHost {
    root: PathBuf,
}

pub const SIMULATED_LOGIN: &str = "sandbox-user";

impl SimulatedHost {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn file_url(path: &std::path::Path) -> Result<Url, StepError> {
        Url::from_file_path(path).map_err(|_| {
            StepError::new(
                FailureKind::ServiceError,
                format!("Cannot express '{}' as a URL", path.display()),
            )
        })
    }
}

impl HostingApi for SimulatedHost {
    fn create_repository(
        &self,
        _token: &AccessToken,
        request: &RepoRequest,
    ) -> Result<RepoDescriptor, StepError> {
        info!("[TEST MODE] Simulating repository creation for: {}", request.name);
        let name = &request.name;
        if name.contains("unauthorized") {
            return Err(StepError::from_status(401, r#"{"message":"Bad credentials"}"#));
        }

        let owner_dir = self.root.join(SIMULATED_LOGIN);
        let bare_path = owner_dir.join(format!("{name}.git"));
        if name.contains("conflict") || bare_path.exists() {
            return Err(StepError::from_status(
                422,
                r#"{"message":"Repository creation failed.","errors":[{"message":"name already exists on this account"}]}"#,
            ));
        }

        let clone_target = if name.contains("unreachable") {
            self.root.join("unreachable").join(format!("{name}.git"))
        } else {
            std::fs::create_dir_all(&owner_dir).map_err(|e| {
                StepError::new(FailureKind::ServiceError, format!("Sandbox unavailable: {e}"))
            })?;
            git2::Repository::init_bare(&bare_path).map_err(|e| {
                StepError::new(FailureKind::ServiceError, format!("Sandbox unavailable: {}", e.message()))
            })?;
            bare_path
        };

        Ok(RepoDescriptor {
            name: name.clone(),
            full_name: format!("{SIMULATED_LOGIN}/{name}"),
            clone_url: Self::file_url(&clone_target)?.to_string(),
            html_url: None,
            owner: RepoOwner {
                login: SIMULATED_LOGIN.to_string(),
            },
        })
    }

    fn get_user(&self, _token: &AccessToken, login: &str) -> Result<UserProfile, StepError> {
        Ok(UserProfile {
            login: login.to_string(),
            name: None,
            email: Some(format!("{login}@sandbox.invalid")),
        })
    }

    fn get_ignore_template(&self, name: &str) -> Result<String, StepError> {
        let source = match name {
            "Go" => "*.exe\n",
            "Node" => "node_modules/\n",
            "Python" => "__pycache__/\n*.py[cod]\n",
            "Java" => "*.class\n*.jar\n",
            "Android" => "*.apk\n.gradle/\n",
            "Rails" => "/log/*\n/tmp/*\n",
            _ => return Err(StepError::from_status(404, r#"{"message":"Not Found"}"#)),
        };
        Ok(source.to_string())
    }
}

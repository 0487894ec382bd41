//! Hosting-provider REST client.
//!
//! Thin client over a GitHub-compatible API: validate a stored token,
//! read repository metadata, list branches. The token travels only in the
//! `Authorization` header of each request and is never logged. Token
//! issuance and repository creation live outside this crate.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "atelier";

/// Errors from the hosting API client
#[derive(Error, Debug)]
pub enum HostingError {
    #[error("hosting request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("hosting api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("the stored hosting token was rejected")]
    InvalidToken,
}

pub type HostingResult<T> = Result<T, HostingError>;

/// Repository metadata as exposed by the hosting provider
#[derive(Debug, Clone, Deserialize)]
pub struct HostedRepository {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub default_branch: String,
    #[serde(rename = "private")]
    pub is_private: bool,
}

/// One branch as exposed by the hosting provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedBranch {
    pub name: String,
    pub sha: String,
    pub protected: bool,
}

#[derive(Deserialize)]
struct ApiBranch {
    name: String,
    commit: ApiCommitRef,
    #[serde(default)]
    protected: bool,
}

#[derive(Deserialize)]
struct ApiCommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

pub struct HostingClient {
    http: reqwest::Client,
    api_base: String,
}

impl HostingClient {
    pub fn new(api_base: Option<String>) -> HostingResult<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    /// Check a token by fetching the authenticated user; returns the login.
    pub async fn validate_token(&self, token: &str) -> HostingResult<String> {
        let url = format!("{}/user", self.api_base);
        let response = self.http.get(&url).bearer_auth(token).send().await?;

        if response.status().as_u16() == 401 {
            return Err(HostingError::InvalidToken);
        }
        let response = Self::check(response).await?;

        let user: ApiUser = response.json().await?;
        debug!(login = %user.login, "validated hosting token");
        Ok(user.login)
    }

    /// Fetch repository metadata.
    pub async fn repository(
        &self,
        owner: &str,
        name: &str,
        token: &str,
    ) -> HostingResult<HostedRepository> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, name);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// List the branches of a repository.
    pub async fn list_branches(
        &self,
        owner: &str,
        name: &str,
        token: &str,
    ) -> HostingResult<Vec<HostedBranch>> {
        let url = format!("{}/repos/{}/{}/branches", self.api_base, owner, name);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let response = Self::check(response).await?;

        let branches: Vec<ApiBranch> = response.json().await?;
        Ok(branches
            .into_iter()
            .map(|b| HostedBranch {
                name: b.name,
                sha: b.commit.sha,
                protected: b.protected,
            })
            .collect())
    }

    async fn check(response: reqwest::Response) -> HostingResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(HostingError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_wire_format_maps_to_public_type() {
        let payload = r#"[
            {"name": "main", "commit": {"sha": "1a2b3c"}, "protected": true},
            {"name": "dev", "commit": {"sha": "4d5e6f"}}
        ]"#;
        let branches: Vec<ApiBranch> = serde_json::from_str(payload).unwrap();
        let mapped: Vec<HostedBranch> = branches
            .into_iter()
            .map(|b| HostedBranch {
                name: b.name,
                sha: b.commit.sha,
                protected: b.protected,
            })
            .collect();

        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].name, "main");
        assert!(mapped[0].protected);
        assert!(!mapped[1].protected);
    }

    #[test]
    fn test_repository_wire_format() {
        let payload = r#"{
            "name": "repo",
            "full_name": "acme/repo",
            "clone_url": "https://github.com/acme/repo.git",
            "default_branch": "main",
            "private": false
        }"#;
        let repo: HostedRepository = serde_json::from_str(payload).unwrap();
        assert_eq!(repo.full_name, "acme/repo");
        assert_eq!(repo.default_branch, "main");
        assert!(!repo.is_private);
    }

    #[test]
    fn test_client_uses_default_base() {
        let client = HostingClient::new(None).unwrap();
        assert_eq!(client.api_base, DEFAULT_API_BASE);

        let client = HostingClient::new(Some("http://localhost:9418".to_string())).unwrap();
        assert_eq!(client.api_base, "http://localhost:9418");
    }
}

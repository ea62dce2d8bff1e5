//! Admin service client for registration, logs, and invalidation calls

use std::collections::BTreeMap;
use std::env;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::AdminError;
use super::AdminApi;
use crate::config::EndpointsConfig;

/// Environment variable carrying an opaque token forwarded to the service
const ADMIN_TOKEN_VAR: &str = "SITEOPS_ADMIN_TOKEN";

/// Registration metadata for a GitHub owner/repo pair.
///
/// The service returns more fields than the console interprets; everything
/// beyond owner/repo is carried opaquely and rendered as-is in the info table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
    /// Signed-in profile, attached client-side after the sign-in flow
    #[serde(skip)]
    pub auth_info: Option<Profile>,
    /// Service-provided fields the console does not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Signed-in user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

impl Profile {
    /// Display form used in the info table's user row
    pub fn display(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// A log entry timestamp as the service serializes it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl Timestamp {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Timestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// One service log entry. All fields are optional on the wire; unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub timestamp: Option<Timestamp>,
    pub route: Option<String>,
    pub source: Option<String>,
    pub org: Option<String>,
    pub site: Option<String>,
    pub user: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub path: Option<String>,
    pub unmodified: Option<u64>,
    pub errors: Vec<String>,
    pub method: Option<String>,
    pub status: Option<u16>,
    /// Duration in milliseconds
    pub duration: Option<u64>,
    pub changes: Vec<String>,
    pub updated: Vec<String>,
}

impl LogEntry {
    /// Entry kind: route wins over source, matching how the service labels rows
    pub fn kind(&self) -> Option<&str> {
        self.route.as_deref().or(self.source.as_deref())
    }
}

// Response types for API deserialization
#[derive(Debug, Deserialize)]
struct InfoResponse {
    error: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    error: Option<String>,
    profile: Option<ProfileBody>,
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    error: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    #[serde(default)]
    entries: Vec<LogEntry>,
}

/// Admin service HTTP client
pub struct AdminClient {
    endpoints: EndpointsConfig,
    client: reqwest::Client,
    token: Option<String>,
}

impl AdminClient {
    /// Create a client against the configured endpoints.
    ///
    /// Picks up an opaque session token from `SITEOPS_ADMIN_TOKEN` if set;
    /// cookies handed out by the service are kept for the process lifetime.
    pub fn new(endpoints: EndpointsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("siteops/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        let token = env::var(ADMIN_TOKEN_VAR).ok().filter(|t| !t.is_empty());
        Ok(Self {
            endpoints,
            client,
            token,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(url).header("Accept", "application/json");
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.post(url);
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, AdminError> {
        let url = self.endpoints.info_url(owner, repo);
        let resp = self
            .get(&url)
            .send()
            .await
            .map_err(|e| AdminError::network("lookup", e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdminError::http(
                "lookup",
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }
        let body: InfoResponse = resp
            .json()
            .await
            .map_err(|e| AdminError::decode("lookup", e.to_string()))?;
        if let Some(message) = body.error {
            return Err(AdminError::service("lookup", message));
        }
        Ok(RepoInfo {
            owner: body.owner.unwrap_or_else(|| owner.to_string()),
            repo: body.repo.unwrap_or_else(|| repo.to_string()),
            auth_info: None,
            extra: body.extra,
        })
    }

    async fn profile(&self, owner: &str, repo: &str) -> Result<Profile, AdminError> {
        let url = self.endpoints.profile_url(owner, repo);
        let resp = self
            .get(&url)
            .send()
            .await
            .map_err(|e| AdminError::network("profile", e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdminError::http(
                "profile",
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }
        let body: ProfileResponse = resp
            .json()
            .await
            .map_err(|e| AdminError::decode("profile", e.to_string()))?;
        if let Some(message) = body.error {
            return Err(AdminError::service("profile", message));
        }
        let profile = body
            .profile
            .ok_or_else(|| AdminError::decode("profile", "missing profile field"))?;
        if let Some(message) = profile.error {
            return Err(AdminError::service("profile", message));
        }
        match (profile.name, profile.email) {
            (Some(name), Some(email)) => Ok(Profile { name, email }),
            _ => Err(AdminError::decode("profile", "incomplete profile")),
        }
    }

    async fn disconnect(&self, owner: &str, repo: &str) -> Result<(), AdminError> {
        let url = self.endpoints.disconnect_url(owner, repo);
        let resp = self
            .post(&url)
            .send()
            .await
            .map_err(|e| AdminError::network("disconnect", e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            // The service puts the rejection reason in the body
            let text = resp
                .text()
                .await
                .map_err(|e| AdminError::decode("disconnect", e.to_string()))?;
            return Err(AdminError::http("disconnect", status.as_u16(), text));
        }
        Ok(())
    }

    async fn logs(
        &self,
        owner: &str,
        repo: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, AdminError> {
        let url = self.endpoints.log_url(owner, repo);
        let resp = self
            .get(&url)
            .query(&[
                ("from", from.to_rfc3339_opts(SecondsFormat::Millis, true)),
                ("to", to.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ])
            .send()
            .await
            .map_err(|e| AdminError::network("logs", e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdminError::http(
                "logs",
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }
        let body: LogsResponse = resp
            .json()
            .await
            .map_err(|e| AdminError::decode("logs", e.to_string()))?;
        Ok(body.entries)
    }

    async fn invalidate(&self, fields: &[(String, String)]) -> Result<String, AdminError> {
        let resp = self
            .post(&self.endpoints.invalidation_url)
            .form(fields)
            .send()
            .await
            .map_err(|e| AdminError::network("invalidation", e.to_string()))?;
        // The body text is the result surface regardless of status
        resp.text()
            .await
            .map_err(|e| AdminError::decode("invalidation", e.to_string()))
    }
}

/// Parse owner and repo from a GitHub repository URL.
///
/// Takes the first two path segments, so deep links
/// (`https://github.com/acme/site/tree/main`) still resolve.
pub fn parse_github_url(input: &str) -> Option<(String, String)> {
    let url = reqwest::Url::parse(input.trim()).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.to_string();
    Some((owner, repo))
}

/// Parse owner and repo from the trailing segments of a stored endpoint path
pub fn parse_trailing_repo(path: &str) -> Option<(String, String)> {
    let url = reqwest::Url::parse(path).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., owner, repo] => Some(((*owner).to_string(), (*repo).to_string())),
        _ => None,
    }
}

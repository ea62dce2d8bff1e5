//! HTTP client layer for the external admin service.
//!
//! Every remote call the console makes goes through the [`AdminApi`] trait so
//! screens can be driven by a scripted implementation in tests. The service's
//! authentication and data semantics are opaque here: requests forward
//! whatever session state the client holds, and payload fields beyond the
//! documented ones are carried through untouched.

pub mod admin;
pub mod error;

pub use admin::{
    parse_github_url, parse_trailing_repo, AdminClient, LogEntry, Profile, RepoInfo, Timestamp,
};
pub use error::AdminError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Seam over the admin service endpoints.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Look up registration info for an owner/repo pair
    async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, AdminError>;

    /// Fetch the signed-in profile for an owner/repo pair
    async fn profile(&self, owner: &str, repo: &str) -> Result<Profile, AdminError>;

    /// Disconnect the registration for an owner/repo pair
    async fn disconnect(&self, owner: &str, repo: &str) -> Result<(), AdminError>;

    /// Fetch service log entries for an owner/repo pair over a UTC window
    async fn logs(
        &self,
        owner: &str,
        repo: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, AdminError>;

    /// POST CDN credentials form-url-encoded to the invalidation service.
    ///
    /// The response body is the result surface, success and failure alike,
    /// so any answered request returns `Ok` with the body text.
    async fn invalidate(&self, fields: &[(String, String)]) -> Result<String, AdminError>;
}

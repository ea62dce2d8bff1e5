//! Log viewer: fetch service log entries for an owner/repo pair over a
//! timeframe and render them as filterable rows.
//!
//! Follows the same split-submission shape as the registration wizard:
//! `begin_fetch` validates and returns the call, the event loop runs it, and
//! `complete_fetch` applies the outcome. Auth failures hand control back to
//! the caller so it can run the sign-in window flow and refetch.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};

use crate::api::{parse_github_url, AdminApi, AdminError, LogEntry};
use crate::config::EndpointsConfig;

pub mod rewrite;

pub use rewrite::{LogRow, LOG_COLUMNS};

/// Timeframe choices shown in the picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeframePreset {
    LastHour,
    Last24Hours,
    Last7Days,
    Today,
    Custom,
}

impl TimeframePreset {
    pub fn all() -> &'static [TimeframePreset] {
        &[
            TimeframePreset::LastHour,
            TimeframePreset::Last24Hours,
            TimeframePreset::Last7Days,
            TimeframePreset::Today,
            TimeframePreset::Custom,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeframePreset::LastHour => "Last hour",
            TimeframePreset::Last24Hours => "Last 24 hours",
            TimeframePreset::Last7Days => "Last 7 days",
            TimeframePreset::Today => "Today",
            TimeframePreset::Custom => "Custom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, TimeframePreset::Custom)
    }

    /// Resolve the preset against a clock. `None` for custom: the from/to
    /// fields are user-edited instead.
    pub fn range(&self, now: DateTime<Local>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let to = now.with_timezone(&Utc);
        let from = match self {
            TimeframePreset::LastHour => to - Duration::hours(1),
            TimeframePreset::Last24Hours => to - Duration::days(1),
            TimeframePreset::Last7Days => to - Duration::days(7),
            TimeframePreset::Today => {
                let midnight = now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is a valid time");
                midnight
                    .and_local_timezone(Local)
                    .single()
                    .map_or(to, |dt| dt.with_timezone(&Utc))
            }
            TimeframePreset::Custom => return None,
        };
        Some((from, to))
    }
}

/// Parse a user-edited custom datetime (`YYYY-MM-DDTHH:MM`, local time)
pub fn parse_custom_datetime(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M").ok()?;
    naive
        .and_local_timezone(Local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a datetime for the custom from/to input fields
pub fn fmt_custom_datetime(value: DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%Y-%m-%dT%H:%M")
        .to_string()
}

/// What the results table is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDisplay {
    NoResults,
    Loading,
    Results,
    Error { title: String, message: String },
}

/// Outcome of applying a fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Done,
    /// Auth failure: run the sign-in window flow for this pair, then refetch
    NeedsSignIn { owner: String, repo: String },
}

/// In-flight log fetch
pub struct LogsCall {
    api: Arc<dyn AdminApi>,
    pub owner: String,
    pub repo: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl LogsCall {
    pub async fn run(self) -> Result<Vec<LogEntry>, AdminError> {
        self.api
            .logs(&self.owner, &self.repo, self.from, self.to)
            .await
    }
}

/// Log viewer state
pub struct LogViewer {
    api: Arc<dyn AdminApi>,
    rows: Vec<LogRow>,
    pub display: TableDisplay,
    filter: String,
    busy: bool,
    last_query: Option<(String, String)>,
}

impl LogViewer {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            rows: Vec::new(),
            display: TableDisplay::NoResults,
            filter: String::new(),
            busy: false,
            last_query: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Submit the timeframe form. Ignored unless the URL parses to an
    /// owner/repo pair and no fetch is already in flight.
    pub fn begin_fetch(
        &mut self,
        github_url: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Option<LogsCall> {
        if self.busy {
            return None;
        }
        let Some((owner, repo)) = parse_github_url(github_url) else {
            tracing::debug!(input = github_url, "not a github repository url");
            return None;
        };
        self.last_query = Some((owner.clone(), repo.clone()));
        self.start(owner, repo, from, to)
    }

    /// Refetch the last query, used once the sign-in window has closed
    pub fn begin_refetch(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<LogsCall> {
        if self.busy {
            return None;
        }
        let (owner, repo) = self.last_query.clone()?;
        self.start(owner, repo, from, to)
    }

    fn start(
        &mut self,
        owner: String,
        repo: String,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Option<LogsCall> {
        self.busy = true;
        self.rows.clear();
        self.filter.clear();
        self.display = TableDisplay::Loading;
        Some(LogsCall {
            api: self.api.clone(),
            owner,
            repo,
            from,
            to,
        })
    }

    /// Apply a fetch outcome. Entries render newest-first.
    pub fn complete_fetch(
        &mut self,
        result: Result<Vec<LogEntry>, AdminError>,
        endpoints: &EndpointsConfig,
    ) -> FetchOutcome {
        self.busy = false;
        match result {
            Ok(entries) => {
                self.rows = entries
                    .iter()
                    .rev()
                    .map(|entry| rewrite::build_row(entry, endpoints))
                    .collect();
                self.display = if self.rows.is_empty() {
                    TableDisplay::NoResults
                } else {
                    TableDisplay::Results
                };
                FetchOutcome::Done
            }
            Err(err) => {
                tracing::warn!(error = %err, "log fetch failed");
                self.display = fetch_error_display(&err);
                if err.is_auth_error() {
                    if let Some((owner, repo)) = self.last_query.clone() {
                        return FetchOutcome::NeedsSignIn { owner, repo };
                    }
                }
                FetchOutcome::Done
            }
        }
    }

    /// Case-insensitive substring filter across a row's cells
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_lowercase();
        for row in &mut self.rows {
            row.hidden = !self.filter.is_empty()
                && !row
                    .cells
                    .iter()
                    .any(|cell| cell.to_lowercase().contains(&self.filter));
        }
    }

    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> Vec<&LogRow> {
        self.rows.iter().filter(|row| !row.hidden).collect()
    }

    /// Clear results back to the empty state
    pub fn clear(&mut self) {
        self.rows.clear();
        self.filter.clear();
        self.display = TableDisplay::NoResults;
    }
}

/// Status-specific texts for failed fetches
pub fn fetch_error_message(status: u16) -> &'static str {
    match status {
        400 => "The request for logs could not be processed.",
        401 => "You need to sign in to view the requested logs.",
        403 => "You do not have permission to view the requested logs.",
        404 => "The requested logs could not be found.",
        _ => "Unable to display the requested logs.",
    }
}

fn fetch_error_display(err: &AdminError) -> TableDisplay {
    match err.status() {
        Some(status) => TableDisplay::Error {
            title: format!("{status} Error"),
            message: fetch_error_message(status).to_string(),
        },
        None => TableDisplay::Error {
            title: "Network Error".to_string(),
            message: err.message().to_string(),
        },
    }
}

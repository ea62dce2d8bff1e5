//! Per-field display rewriting for log entries.
//!
//! The service returns raw log records; rows get human-readable timestamps
//! and durations, grouped status badges, and a deep link whose shape depends
//! on the entry kind.

use crate::api::{LogEntry, Timestamp};
use crate::config::EndpointsConfig;

/// Column order for log rows
pub const LOG_COLUMNS: &[&str] = &[
    "timestamp",
    "route",
    "source",
    "org",
    "site",
    "user",
    "owner",
    "repo",
    "ref",
    "path",
    "unmodified",
    "errors",
    "method",
    "status",
    "duration",
];

/// One rendered log row
#[derive(Debug, Clone)]
pub struct LogRow {
    /// Entry kind (route or source), used for row styling
    pub kind: Option<String>,
    /// Display cells, aligned with [`LOG_COLUMNS`]
    pub cells: Vec<String>,
    /// Deep link for the path cell, if the entry kind has one
    pub link: Option<String>,
    pub status: Option<u16>,
    /// Filtered out by the current filter text
    pub hidden: bool,
}

/// Build a display row from a raw entry
pub fn build_row(entry: &LogEntry, endpoints: &EndpointsConfig) -> LogRow {
    let (path_text, link) = path_display(entry, endpoints);
    let duration = effective_duration(entry);
    let dash = || "-".to_string();
    let cells = vec![
        fmt_timestamp(entry.timestamp.as_ref()),
        entry.route.clone().unwrap_or_else(dash),
        entry.source.clone().unwrap_or_else(dash),
        entry.org.clone().unwrap_or_else(dash),
        entry.site.clone().unwrap_or_else(dash),
        entry.user.clone().unwrap_or_else(dash),
        entry.owner.clone().unwrap_or_else(dash),
        entry.repo.clone().unwrap_or_else(dash),
        entry.reference.clone().unwrap_or_else(dash),
        path_text,
        entry.unmodified.map_or_else(dash, |n| n.to_string()),
        fmt_errors(&entry.errors),
        entry.method.clone().unwrap_or_else(dash),
        entry.status.map_or_else(dash, |s| s.to_string()),
        fmt_duration(duration),
    ];
    LogRow {
        kind: entry.kind().map(str::to_string),
        cells,
        link,
        status: entry.status,
        hidden: false,
    }
}

/// `mm/dd/yyyy HH:MM UTC`, or a dash when absent or unparseable
pub fn fmt_timestamp(timestamp: Option<&Timestamp>) -> String {
    timestamp
        .and_then(Timestamp::to_utc)
        .map_or_else(|| "-".to_string(), |dt| dt.format("%m/%d/%Y %H:%M UTC").to_string())
}

/// Milliseconds as seconds with one decimal
pub fn fmt_duration(duration_ms: Option<u64>) -> String {
    match duration_ms {
        Some(ms) => format!("{:.1} s", ms as f64 / 1000.0),
        None => "-".to_string(),
    }
}

fn fmt_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        "-".to_string()
    } else {
        errors.join(", ")
    }
}

/// Status family for badge styling: 2 for 2xx, 4 for 4xx, 5 for 5xx
pub fn status_group(status: u16) -> u16 {
    status / 100 % 10
}

/// Entry duration, summing per-change `ms` figures for indexer entries that
/// carry timings inside their change list instead of a duration field.
pub fn effective_duration(entry: &LogEntry) -> Option<u64> {
    if entry.duration.is_some() || entry.kind() != Some("indexer") {
        return entry.duration;
    }
    let mut total = 0u64;
    let mut found = false;
    for change in &entry.changes {
        if let Some(ms) = change
            .split(' ')
            .find_map(|token| token.strip_suffix("ms"))
            .and_then(|n| n.parse::<u64>().ok())
        {
            total += ms;
            found = true;
        }
    }
    found.then_some(total)
}

/// Path cell text plus the deep link it points at
pub fn path_display(entry: &LogEntry, endpoints: &EndpointsConfig) -> (String, Option<String>) {
    let value = entry.path.clone().unwrap_or_default();
    let fallback = || {
        if value.is_empty() {
            ("-".to_string(), None)
        } else {
            (value.clone(), None)
        }
    };
    let Some(kind) = entry.kind() else {
        return fallback();
    };

    let admin = endpoints.admin_base.trim_end_matches('/');
    let owner = entry.owner.as_deref().unwrap_or_default();
    let repo = entry.repo.as_deref().unwrap_or_default();
    let reference = entry.reference.as_deref().unwrap_or_default();

    match kind {
        "code" => (
            value.clone(),
            Some(format!("https://github.com/{owner}/{repo}/tree/{reference}")),
        ),
        "config" => {
            let org = entry.org.as_deref().unwrap_or_default();
            let site = entry.site.as_deref().unwrap_or_default();
            (
                value.clone(),
                Some(format!("{admin}/config/{org}/sites/{site}.json")),
            )
        }
        "index" | "live" => (
            value.clone(),
            Some(format!(
                "https://{reference}--{repo}--{owner}.{}{value}",
                endpoints.live_host
            )),
        ),
        "indexer" => {
            let segments: Vec<String> = entry
                .changes
                .iter()
                .map(|change| {
                    change
                        .split(' ')
                        .find(|token| token.starts_with('/'))
                        .unwrap_or("/")
                        .to_string()
                })
                .collect();
            if segments.is_empty() {
                return fallback();
            }
            let link = segments
                .first()
                .map(|s| format!("{admin}/index/{owner}/{repo}/{reference}{s}"));
            (segments.join(", "), link)
        }
        k if k == "job" || k.ends_with("-job") => (
            value.clone(),
            Some(format!("{admin}/job/{owner}/{repo}/{reference}{value}/details")),
        ),
        "preview" => (
            value.clone(),
            Some(format!(
                "https://{reference}--{repo}--{owner}.{}{value}",
                endpoints.preview_host
            )),
        ),
        "sitemap" => {
            if entry.updated.is_empty() {
                return fallback();
            }
            let link = entry.updated.first().map(|path| {
                format!(
                    "https://{reference}--{repo}--{owner}.{}{path}",
                    endpoints.live_host
                )
            });
            (entry.updated.join(", "), link)
        }
        "status" => (
            value.clone(),
            Some(format!("{admin}/status/{owner}/{repo}/{reference}{value}")),
        ),
        other => {
            tracing::warn!(kind = other, "unhandled log entry kind");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str) -> LogEntry {
        LogEntry {
            route: Some(kind.to_string()),
            owner: Some("acme".to_string()),
            repo: Some("site".to_string()),
            reference: Some("main".to_string()),
            path: Some("/blog/post".to_string()),
            ..LogEntry::default()
        }
    }

    #[test]
    fn test_fmt_duration() {
        assert_eq!(fmt_duration(Some(1234)), "1.2 s");
        assert_eq!(fmt_duration(Some(0)), "0.0 s");
        assert_eq!(fmt_duration(None), "-");
    }

    #[test]
    fn test_fmt_timestamp() {
        let ts = Timestamp::Text("2024-03-01T12:30:00.000Z".to_string());
        assert_eq!(fmt_timestamp(Some(&ts)), "03/01/2024 12:30 UTC");
        assert_eq!(fmt_timestamp(None), "-");
    }

    #[test]
    fn test_status_group() {
        assert_eq!(status_group(200), 2);
        assert_eq!(status_group(304), 3);
        assert_eq!(status_group(404), 4);
        assert_eq!(status_group(502), 5);
    }

    #[test]
    fn test_preview_path_links_to_preview_host() {
        let endpoints = EndpointsConfig::default();
        let (text, link) = path_display(&entry("preview"), &endpoints);
        assert_eq!(text, "/blog/post");
        assert_eq!(
            link.as_deref(),
            Some("https://main--site--acme.siteworks.page/blog/post")
        );
    }

    #[test]
    fn test_code_path_links_to_github() {
        let endpoints = EndpointsConfig::default();
        let (_, link) = path_display(&entry("code"), &endpoints);
        assert_eq!(link.as_deref(), Some("https://github.com/acme/site/tree/main"));
    }

    #[test]
    fn test_job_suffix_kinds_link_to_job_details() {
        let endpoints = EndpointsConfig::default();
        let mut e = entry("publish-job");
        e.path = Some("/publish/123".to_string());
        let (_, link) = path_display(&e, &endpoints);
        assert_eq!(
            link.as_deref(),
            Some("https://admin.siteworks.dev/job/acme/site/main/publish/123/details")
        );
    }

    #[test]
    fn test_indexer_changes_become_segments() {
        let endpoints = EndpointsConfig::default();
        let mut e = entry("indexer");
        e.changes = vec![
            "updated /blog/one 12ms".to_string(),
            "updated /blog/two 30ms".to_string(),
            "noop".to_string(),
        ];
        let (text, link) = path_display(&e, &endpoints);
        assert_eq!(text, "/blog/one, /blog/two, /");
        assert_eq!(
            link.as_deref(),
            Some("https://admin.siteworks.dev/index/acme/site/main/blog/one")
        );
    }

    #[test]
    fn test_indexer_duration_summed_from_changes() {
        let mut e = entry("indexer");
        e.changes = vec![
            "updated /blog/one 12ms".to_string(),
            "updated /blog/two 30ms".to_string(),
        ];
        assert_eq!(effective_duration(&e), Some(42));

        // An explicit duration wins
        e.duration = Some(7);
        assert_eq!(effective_duration(&e), Some(7));
    }

    #[test]
    fn test_unknown_kind_falls_back_to_raw_value() {
        let endpoints = EndpointsConfig::default();
        let (text, link) = path_display(&entry("mystery"), &endpoints);
        assert_eq!(text, "/blog/post");
        assert!(link.is_none());
    }

    #[test]
    fn test_build_row_cell_alignment() {
        let endpoints = EndpointsConfig::default();
        let mut e = entry("preview");
        e.status = Some(200);
        e.duration = Some(1500);
        let row = build_row(&e, &endpoints);
        assert_eq!(row.cells.len(), LOG_COLUMNS.len());
        assert_eq!(row.cells[LOG_COLUMNS.iter().position(|c| *c == "status").unwrap()], "200");
        assert_eq!(row.cells[LOG_COLUMNS.iter().position(|c| *c == "duration").unwrap()], "1.5 s");
        assert_eq!(row.kind.as_deref(), Some("preview"));
    }
}

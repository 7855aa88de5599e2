use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::DashboardError;
use crate::models::{Department, Record, Status};
use crate::source::FeedRef;

pub const PROJECT_COL: &str = "Project Name as per the SOW";
pub const SUBMITTED_COL: &str = "File come for QA Date";
pub const STATUS_COL: &str = "QA Status";
pub const FEED_SITE_COL: &str = "Feed(Site) Name";
pub const REVIEWER_COL: &str = "QA Name";
pub const DEPARTMENT_COL: &str = "Department";
pub const STATUS_DATE_COL: &str = "QA status - Date";
pub const FREQUENCY_COL: &str = "Frequency";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    PROJECT_COL,
    SUBMITTED_COL,
    STATUS_COL,
    FEED_SITE_COL,
    REVIEWER_COL,
    DEPARTMENT_COL,
    STATUS_DATE_COL,
    FREQUENCY_COL,
];

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const SHORT_YEAR_DATE_FORMATS: [&str; 4] = ["%m/%d/%y", "%m-%d-%y", "%d-%b-%y", "%d %b %y"];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const SHORT_YEAR_DATETIME_FORMATS: [&str; 2] = ["%m/%d/%y %H:%M:%S%.f", "%m/%d/%y %H:%M"];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Project Name as per the SOW", default)]
    project: String,
    #[serde(rename = "File come for QA Date", default)]
    submitted_on: String,
    #[serde(rename = "QA Status", default)]
    status: String,
    #[serde(rename = "Feed(Site) Name", default)]
    feed_site: String,
    #[serde(rename = "QA Name", default)]
    reviewer: String,
    #[serde(rename = "Department", default)]
    department: String,
    #[serde(rename = "QA status - Date", default)]
    status_on: String,
    #[serde(rename = "Frequency", default)]
    frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub malformed: usize,
    pub department_rows: usize,
    pub undated: usize,
}

#[derive(Debug, Clone)]
pub struct Ingested {
    pub records: Vec<Record>,
    pub stats: IngestStats,
}

/// Decodes the feed body and keeps the dated rows of `department`.
pub fn ingest(
    feed: &FeedRef,
    body: &str,
    department: Department,
) -> Result<Ingested, DashboardError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DashboardError::unavailable(feed, e))?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::Schema { missing });
    }

    let mut stats = IngestStats::default();
    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        stats.rows_read += 1;
        let line = idx + 2;

        let row = match result {
            Ok(row) if row.len() > headers.len() => {
                tracing::warn!(line, fields = row.len(), "skipping row with extra fields");
                stats.malformed += 1;
                continue;
            }
            Ok(mut row) => {
                while row.len() < headers.len() {
                    row.push_field("");
                }
                row
            }
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping unreadable row");
                stats.malformed += 1;
                continue;
            }
        };

        let raw: RawRow = match row.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping undecodable row");
                stats.malformed += 1;
                continue;
            }
        };

        if !department.matches(&raw.department) {
            continue;
        }
        stats.department_rows += 1;

        let (Some(submitted_on), Some(status_on)) =
            (parse_date(&raw.submitted_on), parse_date(&raw.status_on))
        else {
            tracing::debug!(line, "dropping row with unparsable dates");
            stats.undated += 1;
            continue;
        };

        records.push(Record {
            department: raw.department.trim().to_uppercase(),
            project: raw.project.trim().to_string(),
            feed_site: raw.feed_site.trim().to_string(),
            submitted_on,
            status: Status::normalize(&raw.status),
            status_on,
            reviewer: raw.reviewer.trim().to_string(),
            frequency: raw.frequency.trim().to_string(),
        });
    }

    tracing::info!(
        %department,
        rows = stats.rows_read,
        malformed = stats.malformed,
        department_rows = stats.department_rows,
        undated = stats.undated,
        kept = records.len(),
        "ingested feed"
    );

    Ok(Ingested { records, stats })
}

/// Lenient calendar-date coercion; a time-of-day suffix or UTC offset is
/// discarded. `%Y` layouts only count when they yield a four-digit year, so
/// `1/5/24` falls through to the two-digit-year layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    let four_digit = |date: &NaiveDate| (1000..=9999).contains(&date.year());

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .find(four_digit)
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
                .find(four_digit)
        })
        .or_else(|| {
            SHORT_YEAR_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
        .or_else(|| {
            SHORT_YEAR_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

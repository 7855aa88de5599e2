use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::ParseMonthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Department {
    Qc,
    Qa,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Qc => "QC",
            Department::Qa => "QA",
        }
    }

    /// Case-insensitive match against a raw department cell.
    pub fn matches(&self, raw: &str) -> bool {
        raw.trim().to_uppercase() == self.as_str()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Done,
    Rejected,
    Revised,
    Other(String),
}

impl Status {
    pub fn normalize(raw: &str) -> Self {
        let value = raw.trim().to_lowercase();
        match value.as_str() {
            "qa done" => Status::Done,
            "qa rejected" => Status::Rejected,
            "qa done/revised" => Status::Revised,
            _ => Status::Other(value),
        }
    }
}

/// Year-month bucket, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Long form used in headings, e.g. `January - 2024`.
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B - %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub department: String,
    pub project: String,
    pub feed_site: String,
    pub submitted_on: NaiveDate,
    pub status: Status,
    pub status_on: NaiveDate,
    pub reviewer: String,
    pub frequency: String,
}

impl Record {
    pub fn submission_month(&self) -> MonthKey {
        MonthKey::of(self.submitted_on)
    }

    pub fn status_month(&self) -> MonthKey {
        MonthKey::of(self.status_on)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusShare {
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub month_label: String,
    pub total: usize,
    pub done: StatusShare,
    pub rejected: StatusShare,
    pub revised: StatusShare,
    pub unrecognized: usize,
    pub ftr_pct: f64,
    pub rework_pct: f64,
    pub reviewers: Vec<ReviewerSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewerSummary {
    pub reviewer: String,
    pub done: usize,
    pub rejected: usize,
    pub revised: usize,
    pub total: usize,
    pub rejection_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyStatusRow {
    pub date: NaiveDate,
    pub done: usize,
    pub rejected: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyHighlights {
    pub peak_count_day: Option<NaiveDate>,
    /// Mean files per active day.
    pub avg_per_day: f64,
    pub peak_done_day: Option<NaiveDate>,
    pub peak_rejected_day: Option<NaiveDate>,
    pub done_total: usize,
    pub rejected_total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTrend {
    pub month: MonthKey,
    pub counts: Vec<DailyCount>,
    pub breakdown: Vec<DailyStatusRow>,
    pub highlights: DailyHighlights,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTier {
    High,
    Medium,
    Low,
}

impl VolumeTier {
    pub fn for_total(total: usize) -> Self {
        if total > 100 {
            VolumeTier::High
        } else if total > 50 {
            VolumeTier::Medium
        } else {
            VolumeTier::Low
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            VolumeTier::High => "High volume",
            VolumeTier::Medium => "Medium volume",
            VolumeTier::Low => "Low volume",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencySummaryRow {
    pub frequency: String,
    pub done: usize,
    pub rejected: usize,
    pub total: usize,
    pub ftr_pct: u32,
    pub iteration_pct: u32,
    pub volume: VolumeTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencySummary {
    pub rows: Vec<FrequencySummaryRow>,
    /// Footer: sum of every row's total. Percentages are not computed for it.
    pub footer_total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_trimmed_and_lowercased() {
        assert_eq!(Status::normalize("  QA Done "), Status::Done);
        assert_eq!(Status::normalize("QA REJECTED"), Status::Rejected);
        assert_eq!(Status::normalize("qa done/revised"), Status::Revised);
        assert_eq!(
            Status::normalize(" Pending "),
            Status::Other("pending".to_string())
        );
    }

    #[test]
    fn department_match_ignores_case_and_padding() {
        assert!(Department::Qa.matches(" qa "));
        assert!(Department::Qc.matches("QC"));
        assert!(!Department::Qc.matches("QA"));
        assert!(!Department::Qa.matches("QA team"));
    }

    #[test]
    fn month_key_parses_and_orders() {
        let jan: MonthKey = "2024-01".parse().unwrap();
        let dec: MonthKey = "2023-12".parse().unwrap();
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2024-01");
        assert_eq!(jan.label(), "January - 2024");
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("24-01".parse::<MonthKey>().is_err());
        assert!("January".parse::<MonthKey>().is_err());
    }

    #[test]
    fn month_key_serializes_as_string() {
        let key = MonthKey::new(2024, 3).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-03\"");
    }

    #[test]
    fn volume_tiers_use_exclusive_lower_bounds() {
        assert_eq!(VolumeTier::for_total(101), VolumeTier::High);
        assert_eq!(VolumeTier::for_total(100), VolumeTier::Medium);
        assert_eq!(VolumeTier::for_total(51), VolumeTier::Medium);
        assert_eq!(VolumeTier::for_total(50), VolumeTier::Low);
        assert_eq!(VolumeTier::for_total(0), VolumeTier::Low);
    }
}

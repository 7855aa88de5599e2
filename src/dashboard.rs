use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::aggregate::{aggregate_month, available_months, frequency_summary, records_for_month};
use crate::error::DashboardError;
use crate::ingest::{ingest, Ingested};
use crate::models::{DailyTrend, Department, FrequencySummary, MonthKey, MonthSummary};
use crate::source::{FeedRef, FeedSource};
use crate::trend::daily_trend;

/// Informational outcomes that stop a render without being failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    NoDepartmentRows { department: Department },
    NoMonths { department: Department },
    NoRowsForMonth { department: Department, month: MonthKey },
}

impl fmt::Display for EmptyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyState::NoDepartmentRows { department } => {
                write!(f, "No rows found for the {department} department.")
            }
            EmptyState::NoMonths { department } => write!(
                f,
                "No valid months found after filtering for {department} department."
            ),
            EmptyState::NoRowsForMonth { department, month } => write!(
                f,
                "No QA records found for {month} in the {department} department."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    Empty(EmptyState),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub department: Department,
    pub month: MonthKey,
    pub available_months: Vec<MonthKey>,
    pub summary: MonthSummary,
    pub daily: DailyTrend,
    pub frequency: FrequencySummary,
}

/// One department's view over a feed. Every call re-derives from a fresh
/// (or TTL-cached) fetch; nothing is kept between renders.
pub struct Dashboard<S> {
    source: S,
    feed: FeedRef,
    department: Department,
}

impl<S: FeedSource> Dashboard<S> {
    pub fn new(source: S, feed: FeedRef, department: Department) -> Self {
        Self {
            source,
            feed,
            department,
        }
    }

    pub async fn load(&self) -> Result<Ingested, DashboardError> {
        let body = self.source.fetch(&self.feed).await?;
        ingest(&self.feed, &body, self.department)
    }

    pub async fn months(&self) -> Result<Outcome<Vec<MonthKey>>, DashboardError> {
        let ingested = self.load().await?;
        Ok(self.months_of(&ingested))
    }

    fn months_of(&self, ingested: &Ingested) -> Outcome<Vec<MonthKey>> {
        let department = self.department;
        if ingested.stats.department_rows == 0 {
            return Outcome::Empty(EmptyState::NoDepartmentRows { department });
        }
        let months = available_months(&ingested.records);
        if months.is_empty() {
            return Outcome::Empty(EmptyState::NoMonths { department });
        }
        Outcome::Ready(months)
    }

    /// Full render for `month`, defaulting to the most recent month.
    pub async fn render(
        &self,
        month: Option<MonthKey>,
    ) -> Result<Outcome<DashboardView>, DashboardError> {
        let ingested = self.load().await?;
        let available_months = match self.months_of(&ingested) {
            Outcome::Ready(months) => months,
            Outcome::Empty(state) => return Ok(Outcome::Empty(state)),
        };

        let Some(month) = month.or_else(|| available_months.last().copied()) else {
            return Ok(Outcome::Empty(EmptyState::NoMonths {
                department: self.department,
            }));
        };

        let records = &ingested.records;
        let summary = aggregate_month(records, month);
        if summary.total == 0 {
            return Ok(Outcome::Empty(EmptyState::NoRowsForMonth {
                department: self.department,
                month,
            }));
        }

        let daily = daily_trend(records, month);
        let frequency = frequency_summary(&records_for_month(records, month));

        tracing::info!(
            department = %self.department,
            %month,
            total = summary.total,
            reviewers = summary.reviewers.len(),
            days = daily.counts.len(),
            "rendered month"
        );

        Ok(Outcome::Ready(DashboardView {
            department: self.department,
            month,
            available_months,
            summary,
            daily,
            frequency,
        }))
    }

    /// Renders every `period` until `shutdown` resolves, handing each result
    /// to `emit`. Returns the number of renders.
    pub async fn watch<F, E>(
        &self,
        month: Option<MonthKey>,
        period: Duration,
        shutdown: F,
        mut emit: E,
    ) -> usize
    where
        F: Future<Output = ()>,
        E: FnMut(Result<Outcome<DashboardView>, DashboardError>),
    {
        let mut ticker = tokio::time::interval(period);
        tokio::pin!(shutdown);
        let mut renders = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    emit(self.render(month).await);
                    renders += 1;
                }
            }
        }
        tracing::debug!(renders, "watch stopped");
        renders
    }
}

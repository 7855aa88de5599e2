/// Fatal failures of a dashboard render. Empty data is not an error; see
/// `dashboard::EmptyState`.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("feed {feed} is unavailable: {reason}")]
    SourceUnavailable { feed: String, reason: String },
    #[error("required columns are missing in the data: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
}

impl DashboardError {
    pub fn unavailable(feed: impl ToString, reason: impl ToString) -> Self {
        DashboardError::SourceUnavailable {
            feed: feed.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month `{0}`, expected YYYY-MM")]
pub struct ParseMonthError(pub String);

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    DailyCount, DailyHighlights, DailyStatusRow, DailyTrend, MonthKey, Record, Status,
};

/// Day-level activity for `month`, bucketed by the QA-status date rather
/// than the submission date. Days without activity are omitted.
pub fn daily_trend(records: &[Record], month: MonthKey) -> DailyTrend {
    let mut per_day: BTreeMap<NaiveDate, (usize, usize, usize)> = BTreeMap::new();

    for record in records.iter().filter(|r| r.status_month() == month) {
        let entry = per_day.entry(record.status_on).or_insert((0, 0, 0));
        entry.0 += 1;
        match record.status {
            Status::Done => entry.1 += 1,
            Status::Rejected => entry.2 += 1,
            _ => {}
        }
    }

    let counts: Vec<DailyCount> = per_day
        .iter()
        .map(|(date, (count, _, _))| DailyCount {
            date: *date,
            count: *count,
        })
        .collect();

    let breakdown: Vec<DailyStatusRow> = per_day
        .iter()
        .filter(|(_, (_, done, rejected))| done + rejected > 0)
        .map(|(date, (_, done, rejected))| DailyStatusRow {
            date: *date,
            done: *done,
            rejected: *rejected,
            average: (*done + *rejected) as f64 / 2.0,
        })
        .collect();

    let highlights = highlights(&counts, &breakdown);
    DailyTrend {
        month,
        counts,
        highlights,
        breakdown,
    }
}

fn highlights(counts: &[DailyCount], breakdown: &[DailyStatusRow]) -> DailyHighlights {
    let files: usize = counts.iter().map(|day| day.count).sum();
    DailyHighlights {
        peak_count_day: peak_day(counts.iter().map(|day| (day.date, day.count))),
        avg_per_day: if counts.is_empty() {
            0.0
        } else {
            files as f64 / counts.len() as f64
        },
        peak_done_day: peak_day(breakdown.iter().map(|row| (row.date, row.done))),
        peak_rejected_day: peak_day(breakdown.iter().map(|row| (row.date, row.rejected))),
        done_total: breakdown.iter().map(|row| row.done).sum(),
        rejected_total: breakdown.iter().map(|row| row.rejected).sum(),
    }
}

/// Earliest day holding the maximum; `None` when every value is zero.
fn peak_day(values: impl Iterator<Item = (NaiveDate, usize)>) -> Option<NaiveDate> {
    let mut best: Option<(NaiveDate, usize)> = None;
    for (date, v) in values {
        if v > 0 && best.map_or(true, |(_, top)| v > top) {
            best = Some((date, v));
        }
    }
    best.map(|(date, _)| date)
}

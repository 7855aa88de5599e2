use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{
    FrequencySummary, FrequencySummaryRow, MonthKey, MonthSummary, Record, ReviewerSummary,
    Status, StatusShare, VolumeTier,
};

/// Distinct submission months, ascending.
pub fn available_months(records: &[Record]) -> Vec<MonthKey> {
    records
        .iter()
        .map(Record::submission_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn records_for_month(records: &[Record], month: MonthKey) -> Vec<&Record> {
    records
        .iter()
        .filter(|record| record.submission_month() == month)
        .collect()
}

pub fn aggregate_month(records: &[Record], month: MonthKey) -> MonthSummary {
    let month_records = records_for_month(records, month);
    let total = month_records.len();

    let (mut done, mut rejected, mut revised) = (0usize, 0usize, 0usize);
    for record in &month_records {
        match record.status {
            Status::Done => done += 1,
            Status::Rejected => rejected += 1,
            Status::Revised => revised += 1,
            Status::Other(_) => {}
        }
    }

    let done = share(done, total);
    let rejected = share(rejected, total);
    let revised = share(revised, total);

    MonthSummary {
        month,
        month_label: month.label(),
        total,
        unrecognized: total - done.count - rejected.count - revised.count,
        ftr_pct: done.pct,
        rework_pct: rejected.pct + revised.pct,
        done,
        rejected,
        revised,
        reviewers: summarize_reviewers(&month_records),
    }
}

fn share(count: usize, total: usize) -> StatusShare {
    StatusShare {
        count,
        pct: percentage(count, total),
    }
}

pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Per-reviewer rollup. The total only counts recognized statuses, so a
/// reviewer with nothing but unrecognized rows does not appear.
pub fn summarize_reviewers(records: &[&Record]) -> Vec<ReviewerSummary> {
    let mut map: HashMap<&str, (usize, usize, usize)> = HashMap::new();

    for record in records {
        if record.reviewer.is_empty() || matches!(record.status, Status::Other(_)) {
            continue;
        }
        let entry = map.entry(record.reviewer.as_str()).or_insert((0, 0, 0));
        match record.status {
            Status::Done => entry.0 += 1,
            Status::Rejected => entry.1 += 1,
            _ => entry.2 += 1,
        }
    }

    let mut summaries: Vec<ReviewerSummary> = map
        .into_iter()
        .map(|(reviewer, (done, rejected, revised))| {
            let total = done + rejected + revised;
            ReviewerSummary {
                reviewer: reviewer.to_string(),
                done,
                rejected,
                revised,
                total,
                rejection_rate: round_one_decimal(percentage(rejected, total)),
            }
        })
        .collect();

    summaries.sort_by(|a, b| a.total.cmp(&b.total).then_with(|| a.reviewer.cmp(&b.reviewer)));
    summaries
}

/// One decimal place, ties to even.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Done/rejected rollup per frequency label, ordered by label.
pub fn frequency_summary(month_records: &[&Record]) -> FrequencySummary {
    let mut map: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for record in month_records {
        let entry = map.entry(record.frequency.as_str()).or_insert((0, 0));
        match record.status {
            Status::Done => entry.0 += 1,
            Status::Rejected => entry.1 += 1,
            _ => {}
        }
    }

    let rows: Vec<FrequencySummaryRow> = map
        .into_iter()
        .map(|(frequency, (done, rejected))| {
            let total = done + rejected;
            FrequencySummaryRow {
                frequency: frequency.to_string(),
                done,
                rejected,
                total,
                ftr_pct: rounded_pct(done, total),
                iteration_pct: rounded_pct(rejected, total),
                volume: VolumeTier::for_total(total),
            }
        })
        .collect();

    FrequencySummary {
        footer_total: rows.iter().map(|row| row.total).sum(),
        rows,
    }
}

/// `count / total * 100` rounded to the nearest integer, ties to even,
/// computed exactly on integers.
pub fn rounded_pct(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = count * 100;
    let quotient = scaled / total;
    let twice_remainder = (scaled % total) * 2;
    let rounded = if twice_remainder > total || (twice_remainder == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };
    rounded as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn month(raw: &str) -> MonthKey {
        raw.parse().unwrap()
    }

    fn record(status: &str, submitted: &str, status_on: &str, reviewer: &str) -> Record {
        Record {
            department: "QA".to_string(),
            project: "Alpha".to_string(),
            feed_site: "site-a".to_string(),
            submitted_on: date(submitted),
            status: Status::normalize(status),
            status_on: date(status_on),
            reviewer: reviewer.to_string(),
            frequency: "Daily".to_string(),
        }
    }

    fn tagged(status: &str, frequency: &str) -> Record {
        let mut record = record(status, "2024-03-01", "2024-03-01", "Asha");
        record.frequency = frequency.to_string();
        record
    }

    #[test]
    fn months_are_sorted_and_deduplicated() {
        let records = vec![
            record("QA Done", "2024-02-01", "2024-02-02", "Asha"),
            record("QA Done", "2023-12-20", "2024-01-02", "Asha"),
            record("QA Done", "2024-02-15", "2024-02-16", "Ravi"),
        ];
        assert_eq!(
            available_months(&records),
            vec![month("2023-12"), month("2024-02")]
        );
        assert!(available_months(&[]).is_empty());
    }

    #[test]
    fn monthly_example_matches_expected_counts() {
        let records = vec![
            record("QA Done", "2024-01-05", "2024-01-06", "Asha"),
            record("QA Rejected", "2024-01-07", "2024-01-08", "Asha"),
        ];
        let summary = aggregate_month(&records, month("2024-01"));

        assert_eq!(summary.total, 2);
        assert_eq!(summary.done, StatusShare { count: 1, pct: 50.0 });
        assert_eq!(summary.rejected, StatusShare { count: 1, pct: 50.0 });
        assert_eq!(summary.revised, StatusShare { count: 0, pct: 0.0 });
        assert_eq!(summary.month_label, "January - 2024");
        assert_eq!(
            summary.reviewers,
            vec![ReviewerSummary {
                reviewer: "Asha".to_string(),
                done: 1,
                rejected: 1,
                revised: 0,
                total: 2,
                rejection_rate: 50.0,
            }]
        );
    }

    #[test]
    fn status_counts_add_up_to_total() {
        let records = vec![
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Done/Revised", "2024-03-02", "2024-03-02", "Asha"),
            record("QA Rejected", "2024-03-03", "2024-03-03", "Ravi"),
            record("On Hold", "2024-03-04", "2024-03-04", "Ravi"),
            record("QA Done", "2024-04-01", "2024-04-01", "Ravi"),
        ];
        let summary = aggregate_month(&records, month("2024-03"));

        assert_eq!(summary.total, 4);
        assert_eq!(summary.unrecognized, 1);
        assert_eq!(
            summary.done.count
                + summary.rejected.count
                + summary.revised.count
                + summary.unrecognized,
            summary.total
        );
        let pct_sum = summary.done.pct + summary.rejected.pct + summary.revised.pct;
        assert!(pct_sum <= 100.0);
        assert!((pct_sum - 75.0).abs() < 1e-9);
        assert!((summary.rework_pct - 50.0).abs() < 1e-9);
        assert!((summary.ftr_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn percentages_sum_to_hundred_without_unrecognized() {
        let records = vec![
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Rejected", "2024-03-03", "2024-03-03", "Ravi"),
        ];
        let summary = aggregate_month(&records, month("2024-03"));
        let pct_sum = summary.done.pct + summary.rejected.pct + summary.revised.pct;
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_month_yields_zero_percentages() {
        let records = vec![record("QA Done", "2024-03-01", "2024-03-01", "Asha")];
        let summary = aggregate_month(&records, month("2024-05"));

        assert_eq!(summary.total, 0);
        assert_eq!(summary.done.pct, 0.0);
        assert_eq!(summary.rejected.pct, 0.0);
        assert_eq!(summary.revised.pct, 0.0);
        assert!(summary.reviewers.is_empty());
    }

    #[test]
    fn aggregation_is_repeatable() {
        let records = vec![
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Rejected", "2024-03-03", "2024-03-03", "Ravi"),
            record("QA Done/Revised", "2024-03-03", "2024-03-03", "Mei"),
        ];
        assert_eq!(
            aggregate_month(&records, month("2024-03")),
            aggregate_month(&records, month("2024-03"))
        );
    }

    #[test]
    fn reviewer_total_excludes_unrecognized_rows() {
        let records = vec![
            record("QA Rejected", "2024-03-01", "2024-03-01", "Asha"),
            record("On Hold", "2024-03-02", "2024-03-02", "Asha"),
            record("On Hold", "2024-03-02", "2024-03-02", "Ravi"),
        ];
        let summary = aggregate_month(&records, month("2024-03"));

        assert_eq!(summary.reviewers.len(), 1);
        assert_eq!(summary.reviewers[0].total, 1);
        assert_eq!(summary.reviewers[0].rejection_rate, 100.0);
    }

    #[test]
    fn reviewers_sorted_by_total_then_name() {
        let records = vec![
            record("QA Done", "2024-03-01", "2024-03-01", "Ravi"),
            record("QA Done", "2024-03-01", "2024-03-01", "Ravi"),
            record("QA Rejected", "2024-03-01", "2024-03-01", "Mei"),
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Rejected", "2024-03-01", "2024-03-01", "Asha"),
        ];
        let names: Vec<String> = aggregate_month(&records, month("2024-03"))
            .reviewers
            .into_iter()
            .map(|r| r.reviewer)
            .collect();
        assert_eq!(names, vec!["Mei", "Ravi", "Asha"]);
    }

    #[test]
    fn rejection_rate_rounds_to_one_decimal() {
        let records = vec![
            record("QA Rejected", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Done", "2024-03-01", "2024-03-01", "Asha"),
            record("QA Done/Revised", "2024-03-01", "2024-03-01", "Asha"),
        ];
        let summary = aggregate_month(&records, month("2024-03"));
        assert_eq!(summary.reviewers[0].rejection_rate, 33.3);
    }

    #[test]
    fn rejection_rate_ties_round_to_even() {
        let mut records: Vec<Record> = (0..15)
            .map(|_| record("QA Done", "2024-03-01", "2024-03-01", "Asha"))
            .collect();
        records.push(record("QA Rejected", "2024-03-01", "2024-03-01", "Asha"));
        let summary = aggregate_month(&records, month("2024-03"));

        assert_eq!(summary.reviewers[0].total, 16);
        assert_eq!(summary.reviewers[0].rejection_rate, 6.2);
        assert_eq!(round_one_decimal(18.75), 18.8);
        assert_eq!(round_one_decimal(0.25), 0.2);
    }

    #[test]
    fn frequency_rows_count_done_and_rejected_only() {
        let records = vec![
            tagged("QA Done", "Weekly"),
            tagged("QA Done", "Weekly"),
            tagged("QA Done", "Weekly"),
            tagged("QA Rejected", "Weekly"),
            tagged("QA Done/Revised", "Weekly"),
            tagged("On Hold", "Daily"),
        ];
        let refs: Vec<&Record> = records.iter().collect();
        let summary = frequency_summary(&refs);

        assert_eq!(summary.rows.len(), 2);
        let daily = &summary.rows[0];
        assert_eq!(daily.frequency, "Daily");
        assert_eq!((daily.total, daily.ftr_pct, daily.iteration_pct), (0, 0, 0));

        let weekly = &summary.rows[1];
        assert_eq!((weekly.done, weekly.rejected, weekly.total), (3, 1, 4));
        assert_eq!((weekly.ftr_pct, weekly.iteration_pct), (75, 25));
        assert_eq!(weekly.volume, VolumeTier::Low);
        assert_eq!(summary.footer_total, 4);
    }

    #[test]
    fn ftr_and_iteration_always_sum_to_hundred() {
        for total in 1..=60usize {
            for done in 0..=total {
                let ftr = rounded_pct(done, total);
                let iteration = rounded_pct(total - done, total);
                assert_eq!(ftr + iteration, 100, "done={done} total={total}");
            }
        }
    }

    #[test]
    fn rounded_pct_ties_go_to_even() {
        assert_eq!(rounded_pct(1, 8), 12);
        assert_eq!(rounded_pct(7, 8), 88);
        assert_eq!(rounded_pct(1, 3), 33);
        assert_eq!(rounded_pct(2, 3), 67);
        assert_eq!(rounded_pct(0, 0), 0);
    }

    #[test]
    fn volume_comment_boundaries() {
        let build = |done: usize| -> FrequencySummary {
            let records: Vec<Record> = (0..done)
                .map(|_| record("QA Done", "2024-03-01", "2024-03-01", "Asha"))
                .collect();
            let refs: Vec<&Record> = records.iter().collect();
            frequency_summary(&refs)
        };
        assert_eq!(build(100).rows[0].volume, VolumeTier::Medium);
        assert_eq!(build(101).rows[0].volume, VolumeTier::High);
        assert_eq!(build(50).rows[0].volume, VolumeTier::Low);
    }
}

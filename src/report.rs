use std::fmt::Write;

use crate::dashboard::DashboardView;
use crate::models::FrequencySummary;

fn frequency_label(frequency: &str) -> &str {
    if frequency.is_empty() {
        "(blank)"
    } else {
        frequency
    }
}

/// Short plain-text overview for the terminal.
pub fn build_summary(view: &DashboardView) -> String {
    let summary = &view.summary;
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} overview for {}",
        view.department, summary.month_label
    );
    let _ = writeln!(output, "- Total files: {}", summary.total);
    let _ = writeln!(
        output,
        "- Done: {} ({:.1}%)",
        summary.done.count, summary.done.pct
    );
    let _ = writeln!(
        output,
        "- Rejected: {} ({:.1}%)",
        summary.rejected.count, summary.rejected.pct
    );
    let _ = writeln!(
        output,
        "- Done/Revised: {} ({:.1}%)",
        summary.revised.count, summary.revised.pct
    );
    if summary.unrecognized > 0 {
        let _ = writeln!(output, "- Other statuses: {}", summary.unrecognized);
    }
    let _ = writeln!(
        output,
        "- FTR {:.1}% / rework {:.1}%",
        summary.ftr_pct, summary.rework_pct
    );

    if !summary.reviewers.is_empty() {
        let _ = writeln!(output, "Reviewers:");
        for reviewer in summary.reviewers.iter().rev() {
            let _ = writeln!(
                output,
                "- {}: {} done, {} rejected, {} revised (rejection rate {:.1}%)",
                reviewer.reviewer,
                reviewer.done,
                reviewer.rejected,
                reviewer.revised,
                reviewer.rejection_rate
            );
        }
    }

    output
}

/// Markdown report covering every section of the monthly dashboard.
pub fn build_report(view: &DashboardView) -> String {
    let summary = &view.summary;
    let daily = &view.daily;
    let mut output = String::new();

    let _ = writeln!(output, "# Monthly {} Dashboard", view.department);
    let _ = writeln!(
        output,
        "Generated for {} ({} department)",
        summary.month_label, view.department
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total files: {}", summary.total);
    let _ = writeln!(
        output,
        "- Done: {} ({:.1}%)",
        summary.done.count, summary.done.pct
    );
    let _ = writeln!(
        output,
        "- Rejected: {} ({:.1}%)",
        summary.rejected.count, summary.rejected.pct
    );
    let _ = writeln!(
        output,
        "- Done/Revised: {} ({:.1}%)",
        summary.revised.count, summary.revised.pct
    );
    let _ = writeln!(output, "- FTR: {:.1}%", summary.ftr_pct);
    let _ = writeln!(output, "- Rework: {:.1}%", summary.rework_pct);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Reviewer Summary");
    if summary.reviewers.is_empty() {
        let _ = writeln!(output, "No reviewer activity for this month.");
    } else {
        let _ = writeln!(
            output,
            "| Reviewer | Done | Rejected | Revised | Total | Rejection Rate (%) |"
        );
        let _ = writeln!(output, "|---|---:|---:|---:|---:|---:|");
        for reviewer in summary.reviewers.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {:.1} |",
                reviewer.reviewer,
                reviewer.done,
                reviewer.rejected,
                reviewer.revised,
                reviewer.total,
                reviewer.rejection_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily {} Files Trend", view.department);
    if daily.counts.is_empty() {
        let _ = writeln!(output, "No status activity dated in {}.", daily.month);
    } else {
        for day in daily.counts.iter() {
            let _ = writeln!(output, "- {}: {} files", day.date, day.count);
        }
        let highlights = &daily.highlights;
        let _ = writeln!(output);
        if let Some(day) = highlights.peak_count_day {
            let _ = writeln!(output, "- Highest file count on: {}", day);
        }
        let _ = writeln!(
            output,
            "- Average files per day: {:.1}",
            highlights.avg_per_day
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Done vs Rejected by Day");
    if daily.breakdown.is_empty() {
        let _ = writeln!(output, "No done or rejected files in this window.");
    } else {
        let _ = writeln!(output, "| Date | Done | Rejected | Average |");
        let _ = writeln!(output, "|---|---:|---:|---:|");
        for row in daily.breakdown.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {:.1} |",
                row.date, row.done, row.rejected, row.average
            );
        }
        let highlights = &daily.highlights;
        let na = || "N/A".to_string();
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "- Most FTR on: {}",
            highlights.peak_done_day.map_or_else(na, |d| d.to_string())
        );
        let _ = writeln!(
            output,
            "- Most rejections on: {}",
            highlights.peak_rejected_day.map_or_else(na, |d| d.to_string())
        );
        let _ = writeln!(output, "- Total FTR: {}", highlights.done_total);
        let _ = writeln!(output, "- Total rejected: {}", highlights.rejected_total);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Frequency Summary");
    write_frequency_table(&mut output, &view.frequency);

    output
}

fn write_frequency_table(output: &mut String, frequency: &FrequencySummary) {
    let _ = writeln!(
        output,
        "| Frequency (Sheet Name) | Total File | FTR % | Iteration % | Comment on Volume |"
    );
    let _ = writeln!(output, "|---|---:|---:|---:|---|");
    for row in frequency.rows.iter() {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            frequency_label(&row.frequency),
            row.total,
            row.ftr_pct,
            row.iteration_pct,
            row.volume.comment()
        );
    }
    let _ = writeln!(output, "| Total | {} |  |  |  |", frequency.footer_total);
}

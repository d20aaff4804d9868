//! Plain-text rendering of a result for the terminal.

use std::fmt::Write;

use crate::feedback::{FeedbackResult, Notice, NoticeLevel, SubScores};

/// Width of a full (100/100) bar, in columns.
pub const BAR_WIDTH: usize = 40;

fn tag(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "[info]",
        NoticeLevel::Success => "[ok]",
        NoticeLevel::Warning => "[warn]",
        NoticeLevel::Error => "[error]",
    }
}

/// One notice as a single tagged line.
pub fn render_notice(notice: &Notice) -> String {
    format!("{} {}", tag(notice.level), notice.message)
}

/// Horizontal bar chart of the four sub-scores, one row per aspect,
/// followed by `NN/100`.
pub fn render_chart(scores: &SubScores) -> String {
    let entries = scores.entries();
    let label_width = entries.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (label, value) in entries {
        let filled = usize::from(value.min(100)) * BAR_WIDTH / 100;
        let _ = writeln!(
            out,
            "{label:<label_width$} | {}{} {value:>3}/100",
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
        );
    }
    out
}

/// Full report: feedback, strength chart, then notices.
///
/// Unavailable results render only their notices.
pub fn render_report(result: &FeedbackResult) -> String {
    let mut out = String::new();

    if result.is_available() {
        let _ = writeln!(out, "== Score and Feedback ({}) ==", result.source());
        if let Some(overall) = result.overall() {
            let _ = writeln!(out, "Overall: {overall}/100");
        }
        let _ = writeln!(out, "\n{}\n", result.text().trim());

        if let Some(scores) = result.scores() {
            let _ = writeln!(out, "== Essay Strength Overview ==");
            out.push_str(&render_chart(scores));
            out.push('\n');
        }
    }

    for notice in result.notices() {
        let _ = writeln!(out, "{}", render_notice(notice));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackSource;

    fn scores() -> SubScores {
        SubScores {
            grammar: 100,
            coherence: 50,
            organization: 0,
            content_relevance: 75,
        }
    }

    #[test]
    fn test_chart_bar_lengths_scale_with_score() {
        let chart = render_chart(&scores());
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].matches('#').count(), BAR_WIDTH);
        assert_eq!(lines[1].matches('#').count(), BAR_WIDTH / 2);
        assert_eq!(lines[2].matches('#').count(), 0);
        assert_eq!(lines[3].matches('#').count(), 30);
        assert!(lines[3].starts_with("Content Relevance |"));
        assert!(lines[3].ends_with(" 75/100"));
    }

    #[test]
    fn test_chart_labels_are_aligned() {
        let chart = render_chart(&scores());
        let bars: Vec<usize> = chart.lines().filter_map(|l| l.find('|')).collect();
        assert!(bars.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_report_includes_text_chart_and_notices() {
        let mut result = FeedbackResult::produced("Nice work.", FeedbackSource::CloudModel)
            .expect("test: non-empty")
            .with_overall(88)
            .with_scores(scores());
        result.push_notice(Notice::success("Response generated using OpenAI (cloud)."));

        let report = render_report(&result);
        assert!(report.contains("Score and Feedback (cloud model)"));
        assert!(report.contains("Overall: 88/100"));
        assert!(report.contains("Nice work."));
        assert!(report.contains("Essay Strength Overview"));
        assert!(report.contains("[ok] Response generated using OpenAI (cloud)."));
    }

    #[test]
    fn test_report_without_scores_omits_chart() {
        let result = FeedbackResult::produced("Text only.", FeedbackSource::LocalModel)
            .expect("test: non-empty");
        assert!(!render_report(&result).contains("Strength Overview"));
    }

    #[test]
    fn test_unavailable_report_is_notices_only() {
        let result = FeedbackResult::unavailable(Notice::error("No model available."));
        assert_eq!(render_report(&result), "[error] No model available.\n");
    }
}

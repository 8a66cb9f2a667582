//! Slow query log classifier.

use serde::{Deserialize, Serialize};

use super::patterns;
use crate::analyzer::types::{Category, Effort, Finding, Recommendation, ReviewFindings, Severity};

const SLOW_SECONDS: f64 = 10.0;
const VERY_SLOW_SECONDS: f64 = 60.0;
const HIGH_ROWS_EXAMINED: u64 = 1_000_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlowQuerySummary {
    pub total_queries: usize,
    pub total_query_time: f64,
    pub max_query_time: f64,
    pub avg_query_time: f64,
    pub total_lock_time: f64,
    pub queries_over_10s: usize,
    pub queries_over_60s: usize,
    pub high_rows_examined: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQueryReport {
    pub log_name: String,
    pub summary: SlowQuerySummary,
    #[serde(flatten)]
    pub output: ReviewFindings,
}

fn capture<T: std::str::FromStr>(re: &regex::Regex, line: &str) -> Option<T> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn analyze_slow_query_log(content: &str, log_name: &str) -> SlowQueryReport {
    let mut summary = SlowQuerySummary::default();

    for line in content.lines() {
        if let Some(query_time) = capture::<f64>(&patterns::QUERY_TIME, line) {
            summary.total_queries += 1;
            summary.total_query_time += query_time;
            summary.max_query_time = summary.max_query_time.max(query_time);
            if query_time > SLOW_SECONDS {
                summary.queries_over_10s += 1;
            }
            if query_time > VERY_SLOW_SECONDS {
                summary.queries_over_60s += 1;
            }
        }
        if let Some(lock_time) = capture::<f64>(&patterns::LOCK_TIME, line) {
            summary.total_lock_time += lock_time;
        }
        if let Some(rows) = capture::<u64>(&patterns::ROWS_EXAMINED, line) {
            if rows > HIGH_ROWS_EXAMINED {
                summary.high_rows_examined += 1;
            }
        }
    }
    if summary.total_queries > 0 {
        summary.avg_query_time = summary.total_query_time / summary.total_queries as f64;
    }

    log::debug!(
        "{}: {} slow queries, max {:.2}s",
        log_name,
        summary.total_queries,
        summary.max_query_time
    );
    let output = findings(&summary, log_name);
    SlowQueryReport {
        log_name: log_name.to_string(),
        summary,
        output,
    }
}

fn findings(summary: &SlowQuerySummary, log_name: &str) -> ReviewFindings {
    let mut output = ReviewFindings::new();

    if summary.queries_over_60s > 0 {
        output.finding(
            Finding::new(
                Severity::Warning,
                Category::Performance,
                format!("Very slow queries in {log_name}"),
                format!(
                    "Found {} queries taking over 60 seconds",
                    summary.queries_over_60s
                ),
            )
            .with_metric("max_query_time", summary.max_query_time)
            .with_threshold(VERY_SLOW_SECONDS)
            .with_details(format!("Max query time: {:.2}s", summary.max_query_time)),
        );
        output.recommend(
            Recommendation::new(
                2,
                Category::Performance,
                "Optimize slow queries",
                format!("{} queries exceed 60 seconds", summary.queries_over_60s),
            )
            .with_action("Review slow query log, add indexes, optimize query patterns")
            .with_impact("Improved response times")
            .with_effort(Effort::Medium),
        );
    } else if summary.queries_over_10s > 0 {
        output.finding(
            Finding::new(
                Severity::Info,
                Category::Performance,
                format!("Slow queries in {log_name}"),
                format!(
                    "Found {} queries taking over 10 seconds",
                    summary.queries_over_10s
                ),
            )
            .with_details(format!("Max query time: {:.2}s", summary.max_query_time)),
        );
    }

    if summary.high_rows_examined > 0 {
        output.finding(
            Finding::new(
                Severity::Warning,
                Category::Performance,
                format!("Queries examining many rows in {log_name}"),
                format!(
                    "Found {} queries examining over 1M rows",
                    summary.high_rows_examined
                ),
            )
            .with_details("These queries may benefit from better indexes"),
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
# Time: 251208 12:45:08
# User@Host: app[app] @ web1 []
# Query_time: 75.500000  Lock_time: 0.000100 Rows_sent: 1  Rows_examined: 2500000
SELECT * FROM orders WHERE note LIKE '%x%';
# Query_time: 12.0  Lock_time: 0.5 Rows_sent: 10  Rows_examined: 100
SELECT 1;
# Query_time: 1.2.3  Lock_time: 0.1 Rows_sent: 0  Rows_examined: 5
";

    #[test]
    fn test_aggregates_and_skips_malformed_numbers() {
        let report = analyze_slow_query_log(LOG, "slow_query.log (db1)");
        let s = &report.summary;
        assert_eq!(s.total_queries, 2);
        assert!((s.total_query_time - 87.5).abs() < 1e-9);
        assert!((s.max_query_time - 75.5).abs() < 1e-9);
        assert!((s.avg_query_time - 43.75).abs() < 1e-9);
        assert!((s.total_lock_time - 0.6001).abs() < 1e-9);
        assert_eq!(s.queries_over_10s, 2);
        assert_eq!(s.queries_over_60s, 1);
        assert_eq!(s.high_rows_examined, 1);
    }

    #[test]
    fn test_findings_for_slow_and_wide_queries() {
        let report = analyze_slow_query_log(LOG, "slow_query.log (db1)");
        let titles: Vec<&str> = report.output.findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Very slow queries in slow_query.log (db1)",
                "Queries examining many rows in slow_query.log (db1)"
            ]
        );
        assert_eq!(
            report.output.findings[0].details.as_deref(),
            Some("Max query time: 75.50s")
        );
        assert_eq!(report.output.recommendations.len(), 1);
    }

    #[test]
    fn test_empty_log_has_no_findings() {
        let report = analyze_slow_query_log("", "s");
        assert_eq!(report.summary.total_queries, 0);
        assert_eq!(report.summary.avg_query_time, 0.0);
        assert!(report.output.findings.is_empty());
    }
}

use std::fmt::Write;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Orchestrator;
use crate::domain::ValidationStatus;

/// Share of expected keywords that must appear in the answer for retrieval to count.
const KEYWORD_MATCH_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub query: String,
    pub expected_category: String,
    #[serde(default)]
    pub expected_answer_contains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub query: String,
    pub expected_category: String,
    pub actual_category: Option<String>,
    pub actual_answer: Option<String>,
    pub validation: Option<ValidationStatus>,
    pub classification_correct: bool,
    pub retrieval_relevant: bool,
    pub overall_success: bool,
    pub response_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl ResponseTimeStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let average = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - average).powi(2)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            average,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median,
            std_dev: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    /// Percentages in [0, 100].
    pub classification_accuracy: f64,
    pub retrieval_accuracy: f64,
    pub overall_accuracy: f64,
    pub response_time_ms: ResponseTimeStats,
    pub outcomes: Vec<EvalOutcome>,
    pub generated_at: DateTime<Utc>,
}

impl EvalReport {
    pub fn from_outcomes(outcomes: Vec<EvalOutcome>) -> Self {
        let total = outcomes.len();
        let percent = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            }
        };

        let successful = outcomes.iter().filter(|o| o.overall_success).count();
        let classified = outcomes.iter().filter(|o| o.classification_correct).count();
        let relevant = outcomes.iter().filter(|o| o.retrieval_relevant).count();
        let times: Vec<f64> = outcomes.iter().map(|o| o.response_time_ms).collect();

        Self {
            total_queries: total,
            successful_queries: successful,
            failed_queries: total - successful,
            classification_accuracy: percent(classified),
            retrieval_accuracy: percent(relevant),
            overall_accuracy: percent(successful),
            response_time_ms: ResponseTimeStats::from_samples(&times),
            outcomes,
            generated_at: Utc::now(),
        }
    }

    pub fn render_markdown(&self) -> String {
        let t = &self.response_time_ms;
        let verdict = if self.overall_accuracy >= 90.0 {
            "Excellent performance"
        } else if self.overall_accuracy >= 80.0 {
            "Good performance"
        } else {
            "Needs improvement"
        };

        let mut out = String::new();
        let _ = writeln!(out, "# Customer Support System Metrics Report");
        let _ = writeln!(out, "Generated on: {}\n", self.generated_at.to_rfc3339());
        let _ = writeln!(out, "## Overall Performance");
        let _ = writeln!(out, "- **Total Queries Processed**: {}", self.total_queries);
        let _ = writeln!(out, "- **Successful Queries**: {}", self.successful_queries);
        let _ = writeln!(out, "- **Failed Queries**: {}", self.failed_queries);
        let _ = writeln!(out, "- **Overall Accuracy**: {:.1}%\n", self.overall_accuracy);
        let _ = writeln!(out, "## Detailed Metrics");
        let _ = writeln!(
            out,
            "- **Classification Accuracy**: {:.1}%",
            self.classification_accuracy
        );
        let _ = writeln!(out, "- **Retrieval Accuracy**: {:.1}%\n", self.retrieval_accuracy);
        let _ = writeln!(out, "## Response Time (ms)");
        let _ = writeln!(out, "- **Average**: {:.2}", t.average);
        let _ = writeln!(out, "- **Minimum**: {:.2}", t.min);
        let _ = writeln!(out, "- **Maximum**: {:.2}", t.max);
        let _ = writeln!(out, "- **Median**: {:.2}", t.median);
        let _ = writeln!(out, "- **Standard Deviation**: {:.2}\n", t.std_dev);
        let _ = writeln!(out, "## Summary\n{verdict}");
        out
    }
}

/// Whether at least half of `expected` keywords occur in `answer`, case-insensitively.
pub fn answer_is_relevant(answer: &str, expected: &[String]) -> bool {
    if answer.is_empty() || expected.is_empty() {
        return false;
    }
    let answer = answer.to_lowercase();
    let matches = expected
        .iter()
        .filter(|k| answer.contains(&k.to_lowercase()))
        .count();
    matches as f64 >= expected.len() as f64 * KEYWORD_MATCH_RATIO
}

/// Runs every case through the orchestrator with at most `concurrency` in flight.
/// Outcomes come back in case order.
pub async fn evaluate(
    orchestrator: &Orchestrator,
    cases: &[EvalCase],
    concurrency: usize,
) -> EvalReport {
    let outcomes: Vec<EvalOutcome> = stream::iter(cases)
        .map(|case| run_case(orchestrator, case))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let report = EvalReport::from_outcomes(outcomes);
    info!(
        total = report.total_queries,
        overall_accuracy = report.overall_accuracy,
        classification_accuracy = report.classification_accuracy,
        retrieval_accuracy = report.retrieval_accuracy,
        "evaluation finished"
    );
    report
}

async fn run_case(orchestrator: &Orchestrator, case: &EvalCase) -> EvalOutcome {
    let started = Instant::now();
    let result = orchestrator.handle_query(&case.query, None).await;
    let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(response) => {
            let classification_correct = response
                .category
                .as_str()
                .eq_ignore_ascii_case(case.expected_category.trim());
            let retrieval_relevant =
                answer_is_relevant(&response.answer, &case.expected_answer_contains);
            EvalOutcome {
                query: case.query.clone(),
                expected_category: case.expected_category.clone(),
                actual_category: Some(response.category.to_string()),
                actual_answer: Some(response.answer),
                validation: Some(response.validation),
                classification_correct,
                retrieval_relevant,
                overall_success: classification_correct && retrieval_relevant,
                response_time_ms,
                error: None,
            }
        }
        Err(e) => EvalOutcome {
            query: case.query.clone(),
            expected_category: case.expected_category.clone(),
            actual_category: None,
            actual_answer: None,
            validation: None,
            classification_correct: false,
            retrieval_relevant: false,
            overall_success: false,
            response_time_ms,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(classified: bool, relevant: bool, ms: f64) -> EvalOutcome {
        EvalOutcome {
            query: "q".to_string(),
            expected_category: "account".to_string(),
            actual_category: Some("account".to_string()),
            actual_answer: Some("a".to_string()),
            validation: Some(ValidationStatus::Accepted),
            classification_correct: classified,
            retrieval_relevant: relevant,
            overall_success: classified && relevant,
            response_time_ms: ms,
            error: None,
        }
    }

    #[test]
    fn test_keyword_relevance_needs_half() {
        let expected = vec!["settings".to_string(), "security".to_string(), "email".to_string()];
        assert!(!answer_is_relevant("Open Settings", &expected));
        assert!(answer_is_relevant("Open Settings > Security", &expected));
        assert!(!answer_is_relevant("", &expected));
        assert!(!answer_is_relevant("anything", &[]));
    }

    #[test]
    fn test_report_percentages_and_stats() {
        let report = EvalReport::from_outcomes(vec![
            outcome(true, true, 10.0),
            outcome(true, false, 20.0),
            outcome(false, true, 30.0),
            outcome(true, true, 40.0),
        ]);

        assert_eq!(report.total_queries, 4);
        assert_eq!(report.successful_queries, 2);
        assert_eq!(report.failed_queries, 2);
        assert!((report.classification_accuracy - 75.0).abs() < 1e-9);
        assert!((report.retrieval_accuracy - 75.0).abs() < 1e-9);
        assert!((report.overall_accuracy - 50.0).abs() < 1e-9);

        let t = &report.response_time_ms;
        assert_eq!(t.min, 10.0);
        assert_eq!(t.max, 40.0);
        assert!((t.average - 25.0).abs() < 1e-9);
        assert!((t.median - 25.0).abs() < 1e-9);
        assert!((t.std_dev - 125.0f64.sqrt()).abs() < 1e-9);

        let md = report.render_markdown();
        assert!(md.contains("**Overall Accuracy**: 50.0%"));
        assert!(md.contains("Needs improvement"));
    }

    #[test]
    fn test_empty_report() {
        let report = EvalReport::from_outcomes(Vec::new());
        assert_eq!(report.overall_accuracy, 0.0);
        assert_eq!(report.response_time_ms, ResponseTimeStats::default());
    }
}

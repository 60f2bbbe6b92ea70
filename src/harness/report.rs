//! Progress and result reporting
//!
//! ## RunReporter Trait
//!
//! The harness uses a `RunReporter` trait to separate reporting from
//! orchestration. This allows for custom output formats by implementing the
//! trait; [`ConsoleReporter`] is the human-readable default and
//! [`JsonReporter`] emits one machine-readable document per run.
//!
//! Failing subprocesses write their own diagnostics directly to the
//! inherited stderr; reporters only add the harness's contextual lines.

use std::path::Path;

use serde_json::json;

use super::{CaseReport, HarnessError, Summary};

/// Trait for reporting harness progress and results.
pub trait RunReporter {
    /// Called once after enumeration, before the output directory reset.
    fn on_corpus_ready(&mut self, _case_count: usize) {}

    /// Called before each specification file is processed.
    fn on_case_start(&mut self, spec: &Path);

    /// Called before each generated module is executed (write-and-execute
    /// mode only).
    fn on_artifact_start(&mut self, _artifact: &Path) {}

    /// Called when a specification file passes generation and validation.
    fn on_case_passed(&mut self, _case: &CaseReport) {}

    /// Called once with the failure that terminated the run.
    fn on_failure(&mut self, error: &HarnessError);

    /// Called when the run completes, pass or fail.
    fn on_run_complete(&mut self, summary: &Summary);
}

// ============================================================================
// Console reporter
// ============================================================================

/// Default console reporter.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl RunReporter for ConsoleReporter {
    fn on_corpus_ready(&mut self, case_count: usize) {
        println!("collected {} specification file(s)", case_count);
    }

    fn on_case_start(&mut self, spec: &Path) {
        println!("Processing {}", spec.display());
    }

    fn on_artifact_start(&mut self, artifact: &Path) {
        if self.verbose {
            println!("  executing {}", artifact.display());
        }
    }

    fn on_case_passed(&mut self, case: &CaseReport) {
        if self.verbose {
            println!(
                "  ok: {} module(s) in {}ms",
                case.artifacts_executed,
                case.duration.as_millis()
            );
        }
    }

    fn on_failure(&mut self, error: &HarnessError) {
        eprintln!("gencheck: {}", error);
    }

    fn on_run_complete(&mut self, summary: &Summary) {
        println!("{}", render_summary(summary));
    }
}

/// Render the end-of-run summary line.
pub fn render_summary(summary: &Summary) -> String {
    let mut parts = Vec::new();
    if summary.cases_passed > 0 {
        parts.push(format!("{} passed", summary.cases_passed));
    }
    if summary.failure.is_some() {
        parts.push("1 failed".to_string());
    }
    if parts.is_empty() {
        parts.push("no specification files processed".to_string());
    }

    format!(
        "====== {}, {} module(s) executed in {:.2}s ======",
        parts.join(", "),
        summary.artifacts_executed,
        summary.duration.as_secs_f64()
    )
}

// ============================================================================
// JSON reporter
// ============================================================================

/// Machine-readable reporter: accumulates per-case records and prints one
/// JSON document on run completion. Progress lines go to stderr so stdout
/// stays a single well-formed document.
#[derive(Debug, Default)]
pub struct JsonReporter {
    cases: Vec<serde_json::Value>,
    failure: Option<serde_json::Value>,
}

impl JsonReporter {
    fn document(&self, summary: &Summary) -> serde_json::Value {
        json!({
            "cases": self.cases.clone(),
            "failure": self.failure.clone(),
            "summary": {
                "total": summary.cases_total,
                "passed": summary.cases_passed,
                "artifacts_executed": summary.artifacts_executed,
                "duration_ms": summary.duration.as_millis() as u64,
                "ok": summary.failure.is_none(),
            },
        })
    }
}

impl RunReporter for JsonReporter {
    fn on_case_start(&mut self, spec: &Path) {
        eprintln!("Processing {}", spec.display());
    }

    fn on_case_passed(&mut self, case: &CaseReport) {
        self.cases.push(json!({
            "spec": case.spec.display().to_string(),
            "status": "passed",
            "artifacts_executed": case.artifacts_executed,
            "duration_ms": case.duration.as_millis() as u64,
        }));
    }

    fn on_failure(&mut self, error: &HarnessError) {
        self.failure = Some(json!({
            "kind": error.kind(),
            "subject": error.subject().map(|p| p.display().to_string()),
            "exit_status": error.exit_status(),
            "message": error.to_string(),
        }));
    }

    fn on_run_complete(&mut self, summary: &Summary) {
        println!("{:#}", self.document(summary));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::super::FailureSummary;
    use super::*;

    fn summary(passed: usize, total: usize, artifacts: usize, ms: u64, failed: Option<i32>) -> Summary {
        Summary {
            cases_total: total,
            cases_passed: passed,
            artifacts_executed: artifacts,
            duration: Duration::from_millis(ms),
            failure: failed.map(|status| FailureSummary {
                message: format!("exit status {}", status),
                exit_status: status,
            }),
        }
    }

    #[test]
    fn summary_line_for_a_passing_run() {
        insta::assert_snapshot!(
            render_summary(&summary(2, 2, 3, 50, None)),
            @"====== 2 passed, 3 module(s) executed in 0.05s ======"
        );
    }

    #[test]
    fn summary_line_for_a_failing_run() {
        insta::assert_snapshot!(
            render_summary(&summary(1, 3, 1, 1500, Some(2))),
            @"====== 1 passed, 1 failed, 1 module(s) executed in 1.50s ======"
        );
    }

    #[test]
    fn summary_line_for_an_empty_run() {
        insta::assert_snapshot!(
            render_summary(&summary(0, 0, 0, 0, None)),
            @"====== no specification files processed, 0 module(s) executed in 0.00s ======"
        );
    }

    #[test]
    fn json_document_records_cases_and_failure() {
        let mut reporter = JsonReporter::default();
        reporter.on_case_start(Path::new("corpus/a.asn"));
        reporter.on_case_passed(&CaseReport {
            spec: PathBuf::from("corpus/a.asn"),
            artifacts_executed: 2,
            duration: Duration::from_millis(10),
        });
        reporter.on_failure(&HarnessError::Generation {
            spec: PathBuf::from("corpus/b.asn"),
            status: 2,
        });

        let doc = reporter.document(&summary(1, 2, 2, 30, Some(2)));

        assert_eq!(doc["cases"].as_array().unwrap().len(), 1);
        assert_eq!(doc["cases"][0]["spec"], "corpus/a.asn");
        assert_eq!(doc["cases"][0]["status"], "passed");
        assert_eq!(doc["failure"]["kind"], "generation");
        assert_eq!(doc["failure"]["subject"], "corpus/b.asn");
        assert_eq!(doc["failure"]["exit_status"], 2);
        assert_eq!(doc["summary"]["ok"], false);
        assert_eq!(doc["summary"]["passed"], 1);
    }

    #[test]
    fn json_document_for_a_clean_run_has_no_failure() {
        let reporter = JsonReporter::default();
        let doc = reporter.document(&summary(1, 1, 1, 5, None));
        assert!(doc["failure"].is_null());
        assert_eq!(doc["summary"]["ok"], true);
    }
}

//! Harness orchestration
//!
//! A run is a plain ordered sequence of blocking calls on one thread:
//! enumerate the corpus, reset the output directory once, then for each
//! specification file in order run the compiler and validate whatever it
//! generated. The first non-zero subprocess exit status terminates the run at
//! that point; unreached files are simply not processed.
//!
//! ## Modules
//!
//! - `corpus` - specification file discovery
//! - `workdir` - output directory lifecycle
//! - `strategy` - compiler invocation and artifact execution
//! - `report` - progress and result reporting

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod corpus;
pub mod report;
pub mod strategy;
pub mod workdir;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use self::report::RunReporter;
use self::strategy::{CaseStrategy, CommandSpec, Mode, PipeThrough, WriteAndExecute};
use self::workdir::Workdir;

// ============================================================================
// Errors
// ============================================================================

/// Errors that terminate a harness run.
///
/// There is no recoverable tier: every variant aborts the run, and
/// [`HarnessError::exit_status`] decides what the harness process exits with.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no .{} specification files found under '{}'", .ext, .path.display())]
    CorpusEmpty { path: PathBuf, ext: String },

    #[error("invalid output directory '{}': {}", .path.display(), .reason)]
    OutputDir { path: PathBuf, reason: String },

    #[error("generation failed for '{}' (exit status {})", .spec.display(), .status)]
    Generation { spec: PathBuf, status: i32 },

    #[error("validation failed for '{}' (exit status {})", .artifact.display(), .status)]
    Validation { artifact: PathBuf, status: i32 },

    #[error("'{}' timed out after {}s", .subject.display(), .limit_secs)]
    Timeout { subject: PathBuf, limit_secs: u64 },

    #[error("failed to launch '{}': {}", .command, .source)]
    Spawn { command: String, source: std::io::Error },

    #[error("unusable support path: {0}")]
    SupportPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Exit status for the harness process.
    ///
    /// Generation and validation failures propagate the failing subprocess's
    /// status verbatim. Timeout expiry uses 124 (the `timeout(1)` convention,
    /// since an expired child has no status of its own). Everything else is a
    /// plain failure.
    pub fn exit_status(&self) -> i32 {
        match self {
            HarnessError::Generation { status, .. } | HarnessError::Validation { status, .. } => *status,
            HarnessError::Timeout { .. } => 124,
            _ => 1,
        }
    }

    /// Short classification tag, used by machine-readable reports.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::CorpusEmpty { .. } => "corpus-empty",
            HarnessError::OutputDir { .. } => "output-dir",
            HarnessError::Generation { .. } => "generation",
            HarnessError::Validation { .. } => "validation",
            HarnessError::Timeout { .. } => "timeout",
            HarnessError::Spawn { .. } => "spawn",
            HarnessError::SupportPath(_) => "support-path",
            HarnessError::Io(_) => "io",
        }
    }

    /// Path identifying the failing subject, when there is one.
    pub fn subject(&self) -> Option<&std::path::Path> {
        match self {
            HarnessError::Generation { spec, .. } => Some(spec),
            HarnessError::Validation { artifact, .. } => Some(artifact),
            HarnessError::Timeout { subject, .. } => Some(subject),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration and run records
// ============================================================================

/// Configuration for one harness run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Specification file or corpus directory.
    pub path: PathBuf,
    /// Working directory generated modules land in. Reset once per run.
    pub output_dir: PathBuf,
    /// How generated output is validated.
    pub mode: Mode,
    /// External compiler command.
    pub compiler: CommandSpec,
    /// Interpreter used to execute generated modules.
    pub interpreter: CommandSpec,
    /// Extension of specification files when `path` is a directory.
    pub spec_ext: String,
    /// Extension of generated modules in the output directory.
    pub module_ext: String,
    /// Treat an empty corpus as success instead of a configuration error.
    pub allow_empty: bool,
    /// Bounded wait for each subprocess; unbounded when absent.
    pub timeout: Option<Duration>,
    /// Directories prepended to the support-path variable for subprocesses.
    pub support_paths: Vec<PathBuf>,
    /// Environment variable the support paths are prepended to.
    pub support_path_var: String,
}

/// Record for one specification file that passed both stages.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub spec: PathBuf,
    pub artifacts_executed: usize,
    pub duration: Duration,
}

/// The failure that terminated a run, preformatted for reports.
#[derive(Debug, Clone)]
pub struct FailureSummary {
    pub message: String,
    pub exit_status: i32,
}

/// Aggregate result of a run. Exists for the run's duration only.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Files enumerated; unreached files still count toward the total.
    pub cases_total: usize,
    pub cases_passed: usize,
    pub artifacts_executed: usize,
    pub duration: Duration,
    /// Present when the run terminated on a failure.
    pub failure: Option<FailureSummary>,
}

#[derive(Default)]
struct Progress {
    cases_total: usize,
    cases_passed: usize,
    artifacts_executed: usize,
}

// ============================================================================
// Orchestration
// ============================================================================

/// Run the full generate-and-validate sequence over the configured corpus.
///
/// Every failure path reaches the reporter: `on_failure` fires with the
/// terminating error and `on_run_complete` always fires with the summary,
/// pass or fail. The returned error carries the exit status to propagate.
pub fn run_harness(config: &RunConfig, reporter: &mut dyn RunReporter) -> Result<Summary, HarnessError> {
    let start = Instant::now();
    let mut progress = Progress::default();

    let result = run_inner(config, reporter, &mut progress);

    let summary = Summary {
        cases_total: progress.cases_total,
        cases_passed: progress.cases_passed,
        artifacts_executed: progress.artifacts_executed,
        duration: start.elapsed(),
        failure: result.as_ref().err().map(|e| FailureSummary {
            message: e.to_string(),
            exit_status: e.exit_status(),
        }),
    };

    if let Err(e) = &result {
        reporter.on_failure(e);
    }
    reporter.on_run_complete(&summary);

    result.map(|()| summary)
}

fn run_inner(
    config: &RunConfig,
    reporter: &mut dyn RunReporter,
    progress: &mut Progress,
) -> Result<(), HarnessError> {
    let cases = corpus::discover_spec_files(&config.path, &config.spec_ext)?;

    if cases.is_empty() {
        if config.allow_empty {
            return Ok(());
        }
        return Err(HarnessError::CorpusEmpty {
            path: config.path.clone(),
            ext: config.spec_ext.clone(),
        });
    }

    progress.cases_total = cases.len();
    reporter.on_corpus_ready(cases.len());
    info!(cases = cases.len(), "corpus enumerated");

    // The output directory is reset exactly once, before the first
    // specification file is processed. Nothing survives from a prior run.
    let workdir = Workdir::new(&config.output_dir)?;
    workdir.reset()?;

    let env = strategy::support_env(&config.support_paths, &config.support_path_var)?;
    let strategy: Box<dyn CaseStrategy> = match config.mode {
        Mode::WriteAndExecute => Box::new(WriteAndExecute::new(
            workdir,
            config.compiler.clone(),
            config.interpreter.clone(),
            config.module_ext.clone(),
            env,
            config.timeout,
        )),
        Mode::PipeThrough => Box::new(PipeThrough::new(
            config.compiler.clone(),
            config.interpreter.clone(),
            env,
            config.timeout,
        )),
    };

    for spec in &cases {
        reporter.on_case_start(spec);
        let case = strategy.process(spec, reporter)?;
        progress.cases_passed += 1;
        progress.artifacts_executed += case.artifacts_executed;
        reporter.on_case_passed(&case);
    }

    Ok(())
}

//! CLI for the gencheck harness
//!
//! One invocation drives one full run: enumerate, reset the output
//! directory, generate, validate, report.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling
//! `process::exit`. Only the top-level `run()` function handles errors and
//! exits, so the harness exit status is set in exactly one place.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::harness::report::{ConsoleReporter, JsonReporter, RunReporter};
use crate::harness::strategy::{CommandSpec, Mode};
use crate::harness::{RunConfig, run_harness};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Generate-and-validate harness for code-generating compilers
#[derive(Parser, Debug)]
#[command(name = "gencheck")]
#[command(version = VERSION)]
#[command(
    about = "Drive a grammar compiler over a corpus and execute what it generates",
    long_about = None
)]
pub struct Cli {
    /// Specification file or corpus directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Directory generated modules are written to (reset per run)
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        default_value = "parsed"
    )]
    pub output_dir: PathBuf,

    /// How generated output is validated
    #[arg(long, value_enum, default_value = "write")]
    pub mode: ModeArg,

    /// External compiler command (program plus leading arguments)
    #[arg(long, value_name = "CMD")]
    pub compiler: String,

    /// Interpreter used to execute generated modules
    #[arg(long, value_name = "CMD", default_value = "python3")]
    pub interpreter: String,

    /// Extension of specification files when PATH is a directory
    #[arg(long = "spec-ext", value_name = "EXT", default_value = "asn")]
    pub spec_ext: String,

    /// Extension of generated modules in the output directory
    #[arg(long = "module-ext", value_name = "EXT", default_value = "py")]
    pub module_ext: String,

    /// Treat an empty corpus as success instead of an error
    #[arg(long)]
    pub allow_empty: bool,

    /// Kill any subprocess still running after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory prepended to the support-path variable for subprocesses
    #[arg(long = "support-path", value_name = "DIR")]
    pub support_paths: Vec<PathBuf>,

    /// Environment variable the support paths are prepended to
    #[arg(
        long = "support-path-var",
        value_name = "NAME",
        default_value = "PYTHONPATH"
    )]
    pub support_path_var: String,

    /// Report format
    #[arg(long, value_enum, default_value = "console")]
    pub report: ReportArg,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Compiler writes modules into the output directory; each is executed
    Write,
    /// Compiler output is piped straight into the interpreter
    Pipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportArg {
    Console,
    Json,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute one harness run and map its outcome to an exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = build_config(&cli)?;

    let mut reporter: Box<dyn RunReporter> = match cli.report {
        ReportArg::Console => Box::new(ConsoleReporter::new(cli.verbose)),
        ReportArg::Json => Box::new(JsonReporter::default()),
    };

    match run_harness(&config, reporter.as_mut()) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        // The reporter has already surfaced the failure; carry the status out.
        Err(e) => Err(CliError::new("", ExitCode(e.exit_status()))),
    }
}

fn build_config(cli: &Cli) -> CliResult<RunConfig> {
    let compiler = CommandSpec::parse(&cli.compiler)
        .ok_or_else(|| CliError::failure("Error: --compiler requires a non-empty command"))?;
    let interpreter = CommandSpec::parse(&cli.interpreter)
        .ok_or_else(|| CliError::failure("Error: --interpreter requires a non-empty command"))?;

    Ok(RunConfig {
        path: cli.path.clone(),
        output_dir: cli.output_dir.clone(),
        mode: match cli.mode {
            ModeArg::Write => Mode::WriteAndExecute,
            ModeArg::Pipe => Mode::PipeThrough,
        },
        compiler,
        interpreter,
        spec_ext: cli.spec_ext.trim_start_matches('.').to_string(),
        module_ext: cli.module_ext.trim_start_matches('.').to_string(),
        allow_empty: cli.allow_empty,
        timeout: cli.timeout.map(Duration::from_secs),
        support_paths: cli.support_paths.clone(),
        support_path_var: cli.support_path_var.clone(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_minimal() {
        let cli = Cli::try_parse_from(["gencheck", "--compiler", "asngen", "corpus"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("corpus"));
        assert_eq!(cli.output_dir, PathBuf::from("parsed"));
        assert_eq!(cli.mode, ModeArg::Write);
        assert_eq!(cli.interpreter, "python3");
        assert_eq!(cli.spec_ext, "asn");
        assert_eq!(cli.module_ext, "py");
        assert!(!cli.allow_empty);
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_cli_requires_a_compiler() {
        assert!(Cli::try_parse_from(["gencheck", "corpus"]).is_err());
    }

    #[test]
    fn test_cli_parse_pipe_mode() {
        let cli = Cli::try_parse_from([
            "gencheck",
            "--compiler",
            "asngen",
            "--mode",
            "pipe",
            "corpus",
        ])
        .unwrap();
        assert_eq!(cli.mode, ModeArg::Pipe);
    }

    #[test]
    fn test_cli_parse_support_paths_accumulate() {
        let cli = Cli::try_parse_from([
            "gencheck",
            "--compiler",
            "asngen",
            "--support-path",
            "/opt/a",
            "--support-path",
            "/opt/b",
            "corpus",
        ])
        .unwrap();
        assert_eq!(
            cli.support_paths,
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
        assert_eq!(cli.support_path_var, "PYTHONPATH");
    }

    #[test]
    fn test_cli_parse_json_report_and_timeout() {
        let cli = Cli::try_parse_from([
            "gencheck",
            "--compiler",
            "asngen",
            "--report",
            "json",
            "--timeout",
            "30",
            "corpus",
        ])
        .unwrap();
        assert_eq!(cli.report, ReportArg::Json);
        assert_eq!(cli.timeout, Some(30));
    }

    #[test]
    fn test_build_config_splits_commands_and_trims_extensions() {
        let mut cli = Cli::try_parse_from([
            "gencheck",
            "--compiler",
            "python3 pyasn1gen.py",
            "corpus",
        ])
        .unwrap();
        cli.spec_ext = ".asn".to_string();
        cli.module_ext = ".py".to_string();

        let config = build_config(&cli).unwrap();
        assert_eq!(config.compiler, CommandSpec::parse("python3 pyasn1gen.py").unwrap());
        assert_eq!(config.spec_ext, "asn");
        assert_eq!(config.module_ext, "py");
        assert_eq!(config.mode, Mode::WriteAndExecute);
    }

    #[test]
    fn test_build_config_rejects_blank_commands() {
        let mut cli = Cli::try_parse_from(["gencheck", "--compiler", "asngen", "corpus"]).unwrap();
        cli.compiler = "   ".to_string();
        assert!(build_config(&cli).is_err());
    }
}

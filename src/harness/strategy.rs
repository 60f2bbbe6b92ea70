//! Compiler invocation and artifact execution
//!
//! The two validation variants - write-and-execute and pipe-through - sit
//! behind one [`CaseStrategy`] interface. Both block until every subprocess
//! involved has terminated, abort on the first non-zero exit status, and
//! propagate that status verbatim. Child stdout/stderr are inherited so the
//! failing tool's own diagnostics pass through untouched.

use std::collections::BTreeSet;
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::corpus::has_extension;
use super::report::RunReporter;
use super::workdir::Workdir;
use super::{CaseReport, HarnessError};

/// How try_wait is polled under a bounded wait.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Validation mode for generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The compiler writes modules into the working directory; each is
    /// discovered and executed independently.
    WriteAndExecute,
    /// The compiler's output is streamed straight into one interpreter
    /// invocation without touching disk.
    PipeThrough,
}

// ============================================================================
// Command specifications
// ============================================================================

/// A subprocess command: program plus leading arguments.
///
/// Parsed from a whitespace-separated string so interpreter-hosted tools
/// (`python3 pyasn1gen.py`) work without wrapper scripts. Paths containing
/// spaces need a wrapper script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Parse a command string. Returns `None` for an empty or blank string.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Environment extension making the compiler's support library resolvable:
/// `paths` prepended to the variable named `var`, existing entries preserved.
pub fn support_env(paths: &[PathBuf], var: &str) -> Result<Option<(String, OsString)>, HarnessError> {
    if paths.is_empty() {
        return Ok(None);
    }

    let mut entries: Vec<PathBuf> = paths.to_vec();
    if let Some(existing) = env::var_os(var) {
        entries.extend(env::split_paths(&existing));
    }

    let joined = env::join_paths(entries).map_err(|e| HarnessError::SupportPath(e.to_string()))?;
    Ok(Some((var.to_string(), joined)))
}

// ============================================================================
// Case strategy interface
// ============================================================================

/// One "validate generated output for this specification file" strategy.
///
/// Implementations run the external compiler for `spec` and validate
/// whatever it produced, fail-fast: the first non-zero subprocess exit
/// aborts with an error carrying that status.
pub trait CaseStrategy {
    fn process(&self, spec: &Path, reporter: &mut dyn RunReporter) -> Result<CaseReport, HarnessError>;
}

/// Write-and-execute: `compiler <spec> <workdir>` writes modules into the
/// working directory, then each newly produced module runs independently
/// under the interpreter, in lexicographic order.
pub struct WriteAndExecute {
    workdir: Workdir,
    compiler: CommandSpec,
    interpreter: CommandSpec,
    module_ext: String,
    env: Option<(String, OsString)>,
    timeout: Option<Duration>,
}

impl WriteAndExecute {
    pub fn new(
        workdir: Workdir,
        compiler: CommandSpec,
        interpreter: CommandSpec,
        module_ext: String,
        env: Option<(String, OsString)>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            workdir,
            compiler,
            interpreter,
            module_ext,
            env,
            timeout,
        }
    }

    fn list_modules(&self) -> io::Result<BTreeSet<PathBuf>> {
        let mut modules = BTreeSet::new();
        for entry in fs::read_dir(self.workdir.path())? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && has_extension(&path, &self.module_ext) {
                modules.insert(path);
            }
        }
        Ok(modules)
    }
}

impl CaseStrategy for WriteAndExecute {
    fn process(&self, spec: &Path, reporter: &mut dyn RunReporter) -> Result<CaseReport, HarnessError> {
        let start = Instant::now();

        // Snapshot the listing so only modules this file produced run below.
        // The working directory is reset once per run, not per file.
        let known = self.list_modules()?;

        let mut cmd = self.compiler.command();
        cmd.arg(spec).arg(self.workdir.path());
        let status = run_blocking(cmd, &self.compiler, &self.env, self.timeout, spec)?;
        if !status.success() {
            return Err(HarnessError::Generation {
                spec: spec.to_path_buf(),
                status: exit_code(&status),
            });
        }

        // BTreeSet iteration is already lexicographic. Zero new modules is a
        // valid, if uninteresting, outcome.
        let produced: Vec<PathBuf> = self
            .list_modules()?
            .into_iter()
            .filter(|m| !known.contains(m))
            .collect();

        let mut executed = 0;
        for module in &produced {
            reporter.on_artifact_start(module);
            let mut cmd = self.interpreter.command();
            cmd.arg(module);
            let status = run_blocking(cmd, &self.interpreter, &self.env, self.timeout, module)?;
            if !status.success() {
                return Err(HarnessError::Validation {
                    artifact: module.clone(),
                    status: exit_code(&status),
                });
            }
            executed += 1;
        }

        Ok(CaseReport {
            spec: spec.to_path_buf(),
            artifacts_executed: executed,
            duration: start.elapsed(),
        })
    }
}

/// Pipe-through: the compiler's stdout streams into the interpreter's stdin,
/// one logical artifact per specification file, validated inside the same
/// pipeline. Compiler failure classifies as a generation error and takes
/// precedence over the interpreter's status.
pub struct PipeThrough {
    compiler: CommandSpec,
    interpreter: CommandSpec,
    env: Option<(String, OsString)>,
    timeout: Option<Duration>,
}

impl PipeThrough {
    pub fn new(
        compiler: CommandSpec,
        interpreter: CommandSpec,
        env: Option<(String, OsString)>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            compiler,
            interpreter,
            env,
            timeout,
        }
    }
}

impl CaseStrategy for PipeThrough {
    fn process(&self, spec: &Path, _reporter: &mut dyn RunReporter) -> Result<CaseReport, HarnessError> {
        let start = Instant::now();

        let mut gen_cmd = self.compiler.command();
        gen_cmd.arg(spec).stdout(Stdio::piped());
        if let Some((var, value)) = &self.env {
            gen_cmd.env(var, value);
        }
        debug!(command = %self.compiler, subject = %spec.display(), "spawning generator");
        let mut generator = gen_cmd.spawn().map_err(|source| HarnessError::Spawn {
            command: self.compiler.to_string(),
            source,
        })?;

        let Some(stream) = generator.stdout.take() else {
            let _ = generator.kill();
            let _ = generator.wait();
            return Err(HarnessError::Spawn {
                command: self.compiler.to_string(),
                source: io::Error::other("generator stdout unavailable"),
            });
        };

        let mut exec_cmd = self.interpreter.command();
        exec_cmd.stdin(stream);
        if let Some((var, value)) = &self.env {
            exec_cmd.env(var, value);
        }
        debug!(command = %self.interpreter, subject = %spec.display(), "spawning interpreter");
        let mut executor = match exec_cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                let _ = generator.kill();
                let _ = generator.wait();
                return Err(HarnessError::Spawn {
                    command: self.interpreter.to_string(),
                    source,
                });
            }
        };

        let gen_status = match wait_bounded(&mut generator, self.timeout, spec) {
            Ok(status) => status,
            Err(err) => {
                let _ = executor.kill();
                let _ = executor.wait();
                return Err(err);
            }
        };
        let exec_status = wait_bounded(&mut executor, self.timeout, spec)?;

        if !gen_status.success() {
            return Err(HarnessError::Generation {
                spec: spec.to_path_buf(),
                status: exit_code(&gen_status),
            });
        }
        if !exec_status.success() {
            return Err(HarnessError::Validation {
                artifact: spec.to_path_buf(),
                status: exit_code(&exec_status),
            });
        }

        Ok(CaseReport {
            spec: spec.to_path_buf(),
            artifacts_executed: 1,
            duration: start.elapsed(),
        })
    }
}

// ============================================================================
// Blocking subprocess plumbing
// ============================================================================

/// Spawn `cmd` with inherited stdio and block until it terminates,
/// optionally bounded by `timeout`.
fn run_blocking(
    mut cmd: Command,
    command: &CommandSpec,
    env: &Option<(String, OsString)>,
    timeout: Option<Duration>,
    subject: &Path,
) -> Result<ExitStatus, HarnessError> {
    if let Some((var, value)) = env {
        cmd.env(var, value);
    }
    debug!(command = %command, subject = %subject.display(), "spawning");
    let mut child = cmd.spawn().map_err(|source| HarnessError::Spawn {
        command: command.to_string(),
        source,
    })?;
    wait_bounded(&mut child, timeout, subject)
}

/// Block until `child` exits. With a limit, poll `try_wait` and kill at the
/// deadline; the child is always reaped before returning.
fn wait_bounded(child: &mut Child, timeout: Option<Duration>, subject: &Path) -> Result<ExitStatus, HarnessError> {
    let Some(limit) = timeout else {
        return Ok(child.wait()?);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            child.kill()?;
            let _ = child.wait();
            return Err(HarnessError::Timeout {
                subject: subject.to_path_buf(),
                limit_secs: limit.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Exit code of a finished subprocess; abnormal termination (no code, e.g.
/// killed by a signal) maps to plain failure.
fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#![forbid(unsafe_code)]
//! gencheck — generate-and-validate harness for code-generating compilers
//!
//! Given a corpus of grammar specification files, gencheck drives an external
//! compiler to produce target-language source modules, then executes each
//! module as a subprocess to confirm it loads and runs without error. It is a
//! correctness gate, not a benchmark: processing is strictly sequential, the
//! first failing subprocess aborts the run, and that subprocess's exit status
//! becomes the harness's own.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a harness bug (logic error), use `.expect("INVARIANT: reason")` with a
//!   clear explanation.

pub mod cli;
pub mod harness;

pub use harness::corpus;
pub use harness::report::{ConsoleReporter, JsonReporter, RunReporter};
pub use harness::strategy::{CommandSpec, Mode};
pub use harness::workdir::Workdir;
pub use harness::{CaseReport, HarnessError, RunConfig, Summary, run_harness};

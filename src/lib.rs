//! leakgate: a pre-commit hook that gates commits on a secret scan.
//!
//! Git invokes the gate immediately before finalizing a commit. The gate
//! extracts the staged diff, pipes it to an external secret scanner
//! (gitleaks by default), and converts the scanner's result into the exit
//! status git acts on: 0 lets the commit proceed, non-zero aborts it.
//!
//! The gate is stateless and single-shot, and it fails closed: a scanner
//! that cannot run blocks the commit just as a flagged change does, with an
//! operator message distinguishing the two.
//!
//! # Architecture
//!
//! - **[`extract`]** — Enumerating the pending change: [`extract::ChangeSource`] trait, `git diff --cached` implementation.
//! - **[`scan`]** — Classification: [`scan::Classifier`] trait, subprocess adapter around the scanner binary.
//! - **[`gate`]** — The controller mapping extraction + classification to a [`Verdict`].
//! - **[`verdict`]** — Decision types and the exit-status contract.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — stderr operator output and the append-only decision log.
//! - **[`hook`]** — `leakgate install`, writing `.git/hooks/pre-commit`.

/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// The gate's error taxonomy.
pub mod error;
/// Candidate-change extraction from the version-control system.
pub mod extract;
/// Gate controller: extraction, classification, verdict.
pub mod gate;
/// Pre-commit hook installation.
pub mod hook;
/// Operator logging and the decision log.
pub mod logging;
/// Content classification behind the external scanner.
pub mod scan;
/// Verdict and exit-status types.
pub mod verdict;

pub use error::GateError;
pub use verdict::{BlockCause, Verdict};

use config::Config;
use extract::GitStagedChanges;
use gate::Gate;
use scan::ExternalScanner;

/// Wire the configured extractor and scanner together and run the gate once.
///
/// This is the entry point used by the binary. A scanner command that cannot
/// even be tokenized blocks the commit like any other scanner failure.
pub fn run_gate(config: &Config) -> Verdict {
    let scanner = match ExternalScanner::from_config(&config.scanner) {
        Ok(scanner) => scanner,
        Err(e) => {
            let verdict = Verdict::Blocked {
                cause: BlockCause::ToolUnavailable,
                reason: e.to_string(),
            };
            if let Some(msg) = verdict.describe() {
                log::error!("{msg}");
            }
            return verdict;
        }
    };
    let source = GitStagedChanges::from_config(&config.git);
    Gate::new(&source, &scanner).run()
}

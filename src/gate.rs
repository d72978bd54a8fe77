//! The gate controller: extraction, classification, verdict.

use crate::error::GateError;
use crate::extract::ChangeSource;
use crate::scan::{Classification, Classifier};
use crate::verdict::{BlockCause, Verdict};

/// Orchestrates one gate invocation: fetch the pending change, classify it,
/// and map the outcome to a [`Verdict`].
///
/// Stateless across invocations; the change is dropped as soon as the
/// verdict exists. Every failure path blocks the commit: a gate that cannot
/// evaluate its control must not wave the action through.
pub struct Gate<'a> {
    source: &'a dyn ChangeSource,
    classifier: &'a dyn Classifier,
}

impl<'a> Gate<'a> {
    pub fn new(source: &'a dyn ChangeSource, classifier: &'a dyn Classifier) -> Self {
        Self { source, classifier }
    }

    /// Produce the verdict for the pending commit.
    pub fn decide(&self) -> Verdict {
        let change = match self.source.extract() {
            Ok(change) => change,
            Err(e) => {
                return Verdict::Blocked {
                    cause: BlockCause::ContentUnavailable,
                    reason: e.to_string(),
                };
            }
        };

        if change.is_empty() {
            log::info!("nothing staged, nothing to scan");
            return Verdict::Allowed;
        }

        log::debug!("classifying {} bytes of staged changes", change.len());
        match self.classifier.classify(&change) {
            Ok(Classification::Clean) => Verdict::Allowed,
            Ok(Classification::Flagged { reason }) => Verdict::Blocked {
                cause: BlockCause::Flagged,
                reason,
            },
            Err(e) => {
                let cause = match &e {
                    GateError::ContentUnavailable { .. } => BlockCause::ContentUnavailable,
                    _ => BlockCause::ToolUnavailable,
                };
                Verdict::Blocked {
                    cause,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Decide and emit the operator-facing status lines.
    ///
    /// The caller owns the exit: map the returned verdict through
    /// [`Verdict::exit_code`].
    pub fn run(&self) -> Verdict {
        let verdict = self.decide();
        match verdict.describe() {
            None => log::info!("staged changes clean, commit may proceed"),
            Some(msg) => log::error!("{msg}"),
        }
        verdict
    }
}

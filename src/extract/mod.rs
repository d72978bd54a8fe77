//! Enumerating the pending change from the version-control system.
//!
//! The gate never interprets the change; it only carries the bytes from the
//! extractor to the classifier.

/// Git-backed extraction of the staged diff.
pub mod git;

pub use git::GitStagedChanges;

use crate::error::GateError;

/// The content that would be persisted by the pending commit.
///
/// Opaque to the gate: an ordered byte buffer (text and binary diffs mixed),
/// read-only, dropped once the verdict is out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateChange {
    bytes: Vec<u8>,
}

impl CandidateChange {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for CandidateChange {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

/// Anything that can enumerate the pending change.
///
/// One real implementation ([`GitStagedChanges`]); tests substitute their own.
pub trait ChangeSource: Send + Sync {
    fn extract(&self) -> Result<CandidateChange, GateError>;
}

//! Error types surfaced by invariant checks.

use std::error::Error;
use std::fmt;

/// Internal bookkeeping disagreed with a structural invariant.
///
/// Returned by the policies' `check_invariants` methods; seeing one in
/// practice means a policy implementation bug, not a caller mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError {
    message: String,
}

impl InvariantError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violated: {}", self.message)
    }
}

impl Error for InvariantError {}

//! Partial-update options and results.

use serde::Serialize;

/// Controls how a partial update is applied.
///
/// The default updates only the first matching document (in store order),
/// even when the filter matches everything, and performs no schema checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Apply the update to every matching document instead of the first.
    pub multi: bool,
    /// Check the updated fields against the model schema before applying them.
    pub run_validators: bool,
}

impl UpdateOptions {
    pub fn validated() -> Self {
        Self { run_validators: true, ..Self::default() }
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }
}

/// Outcome of a partial update. Zero matches is still a success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

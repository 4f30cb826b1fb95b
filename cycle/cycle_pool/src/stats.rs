//! Pool activity counters.

use serde::Serialize;

/// Statistics about a resource pool
///
/// All counters are cumulative over the lifetime of the pool.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Total number of resources created (initial and on demand)
    pub created: u64,

    /// Successful acquisitions
    pub acquired: u64,

    /// Releases performed by callers
    pub released: u64,

    /// Resources released by shutdown because their caller never did
    pub force_released: u64,

    /// Acquisitions that had to wait for a release
    pub waits: u64,

    /// `activate` calls that failed
    pub activate_failures: u64,

    /// `deactivate` calls that failed, including during shutdown
    pub deactivate_failures: u64,

    /// Completed updater passes
    pub update_passes: u64,

    /// Individual `update` calls made by the updater
    pub update_calls: u64,

    /// `update` calls that failed or panicked
    pub update_failures: u64,
}

impl PoolStats {
    /// Every successful activation has been matched by a deactivation
    pub fn is_balanced(&self) -> bool {
        self.acquired == self.released + self.force_released
    }

    /// Number of leases that have not been released yet
    pub fn outstanding(&self) -> u64 {
        self.acquired
            .saturating_sub(self.released + self.force_released)
    }
}

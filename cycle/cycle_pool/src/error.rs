//! Error types for the pool.
//!
//! Caller-facing operations return [`PoolError`]. Failures raised by a
//! pooled resource itself are carried as [`ResourceError`] inside the
//! matching `PoolError` variant; updater failures never reach a caller and
//! are only logged and counted.

use crate::resource::{LeaseId, PoolId, ResourceId};
use std::time::Duration;
use thiserror::Error;

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Failure reported by a resource from `activate`, `deactivate` or `update`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ResourceError {
    message: String,
}

impl ResourceError {
    /// Create a new resource error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message describing the failure
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Misuse of the pool API by a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// The handle was issued by a different pool
    #[error("handle belongs to pool {found}, not pool {expected}")]
    ForeignHandle {
        /// The pool the release was attempted on
        expected: PoolId,
        /// The pool that issued the handle
        found: PoolId,
    },

    /// The lease is not currently active (released twice, or force-released at shutdown)
    #[error("lease {lease} of resource {id} is not active")]
    NotActive {
        /// The lease presented to `release`
        lease: LeaseId,
        /// The resource the lease referred to
        id: ResourceId,
    },
}

/// Errors returned by pool operations
#[derive(Error, Debug)]
pub enum PoolError {
    /// The caller violated the acquire/release contract
    #[error("pool usage error: {0}")]
    Usage(#[from] UsageError),

    /// The resource failed to activate; it has been returned to the free set
    #[error("resource {id} failed to activate: {source}")]
    Activate {
        /// The resource that failed
        id: ResourceId,
        /// The failure reported by the resource
        source: ResourceError,
    },

    /// The resource failed to deactivate; it was still moved to the free set
    #[error("resource {id} failed to deactivate: {source}")]
    Deactivate {
        /// The resource that failed
        id: ResourceId,
        /// The failure reported by the resource
        source: ResourceError,
    },

    /// The pool is shut down or shutting down
    #[error("resource pool is shut down")]
    ShutDown,

    /// No resource is free and the pool cannot grow
    #[error("resource pool exhausted")]
    Exhausted,

    /// No resource became free before the deadline
    #[error("timeout waiting for resource after {0:?}")]
    Timeout(Duration),

    /// The updater thread could not be started
    #[error("failed to spawn updater thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl PoolError {
    /// Whether this error reports caller misuse rather than a runtime condition
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// Errors reading or writing a pool configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration text could not be parsed
    #[error("invalid pool configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML
    #[error("failed to serialize pool configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_converts_into_pool_error() {
        let err: PoolError = UsageError::NotActive {
            lease: LeaseId::new(7),
            id: ResourceId::new(3),
        }
        .into();

        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "pool usage error: lease lease-7 of resource resource-3 is not active"
        );
    }

    #[test]
    fn test_collaborator_error_display() {
        let err = PoolError::Activate {
            id: ResourceId::new(1),
            source: ResourceError::new("socket closed"),
        };

        assert!(!err.is_usage());
        assert_eq!(
            err.to_string(),
            "resource resource-1 failed to activate: socket closed"
        );
    }
}

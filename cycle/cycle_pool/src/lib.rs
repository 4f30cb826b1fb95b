#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Cycle Pool
//!
//! A concurrent pool of reusable resources that cycle through
//! acquire → active → release, with a background updater that keeps calling
//! `update()` on every resource that is currently checked out.
//!
//! This crate provides:
//!
//! - The [`Resource`] capability contract for pooled objects
//! - A [`Pool`] with a fixed (blocking) or growable acquisition policy
//! - An updater thread owned by the pool and joined at teardown
//! - RAII leases through [`ResourceGuard`]
//!
//! ## Example
//!
//! ```
//! use cycle_pool::{Pool, PoolConfig, Resource, ResourceError};
//!
//! #[derive(Default)]
//! struct Sprite;
//!
//! impl Resource for Sprite {
//!     fn activate(&self) -> Result<(), ResourceError> { Ok(()) }
//!     fn deactivate(&self) -> Result<(), ResourceError> { Ok(()) }
//!     fn update(&self) -> Result<(), ResourceError> { Ok(()) }
//! }
//!
//! let pool = Pool::<Sprite>::new(PoolConfig::fixed(2)).unwrap();
//! let handle = pool.acquire().unwrap();
//! assert_eq!(pool.active_count(), 1);
//! pool.release(&handle).unwrap();
//! assert_eq!(pool.free_count(), 2);
//! ```

/// Pool configuration and its TOML representation
pub mod config;

/// Error types for pool operations and collaborator failures
pub mod error;

/// RAII lease that releases on drop
pub mod guard;

/// The pool itself: free/active membership and acquisition policies
pub mod pool;

/// The resource capability contract and the handles given to callers
pub mod resource;

/// Counters describing pool activity
pub mod stats;

mod updater;

// Re-export key types for easier access
pub use config::{PoolConfig, MAX_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL};
pub use error::{ConfigError, PoolError, ResourceError, Result, UsageError};
pub use guard::ResourceGuard;
pub use pool::{Pool, ShutdownReport};
pub use resource::{LeaseId, PoolId, Resource, ResourceHandle, ResourceId};
pub use stats::PoolStats;

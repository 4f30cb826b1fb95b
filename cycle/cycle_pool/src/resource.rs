//! The capability contract for pooled resources and the handles given out by
//! the pool.
//!
//! The pool never looks inside a resource. It only needs three transitions:
//! [`Resource::activate`] when a resource leaves the free set,
//! [`Resource::deactivate`] when it comes back, and [`Resource::update`],
//! which the updater calls over and over while the resource is active.

use crate::error::ResourceError;
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A trait for resources that can be pooled
///
/// A checked-out resource is reachable from its caller and from the updater
/// at the same time, so every method takes `&self` and implementations bring
/// their own interior mutability.
///
/// None of the methods may block indefinitely or call back into the pool
/// that owns the resource; they run while the pool lock is held.
pub trait Resource: Send + Sync + 'static {
    /// Prepare the resource for a caller. Called once per acquire.
    fn activate(&self) -> Result<(), ResourceError>;

    /// Return the resource to its idle state. Called once per release,
    /// including the forced release performed at shutdown.
    fn deactivate(&self) -> Result<(), ResourceError>;

    /// Advance the resource. Called repeatedly while it is active.
    fn update(&self) -> Result<(), ResourceError>;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier value
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw identifier value
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identity of a resource, unique within its pool and stable for its lifetime
    ResourceId,
    "resource"
);

define_id!(
    /// Identity of one checkout; a fresh lease is issued on every acquire
    LeaseId,
    "lease"
);

define_id!(
    /// Process-wide identity of a pool
    PoolId,
    "pool"
);

impl PoolId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Run one resource callback, turning a panic into a [`ResourceError`]
pub(crate) fn invoke<F>(operation: &str, callback: F) -> Result<(), ResourceError>
where
    F: FnOnce() -> Result<(), ResourceError>,
{
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(result) => result,
        Err(payload) => Err(ResourceError::new(format!(
            "{operation} panicked: {}",
            panic_message(&*payload)
        ))),
    }
}

/// Extract the message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<unknown panic>".to_string())
}

/// A resource together with its identity, as stored in the pool collections
pub(crate) struct Slot<R> {
    pub(crate) id: ResourceId,
    pub(crate) resource: Arc<R>,
}

impl<R> Slot<R> {
    pub(crate) fn new(id: ResourceId, resource: R) -> Self {
        Self {
            id,
            resource: Arc::new(resource),
        }
    }
}

/// A handle to an acquired resource
///
/// The handle is valid from `acquire` until the matching `release`. Clones
/// refer to the same lease, so releasing through one clone invalidates all
/// of them. Dropping a handle does not release the resource; forgotten
/// resources are force-released when the pool shuts down.
pub struct ResourceHandle<R> {
    pool: PoolId,
    lease: LeaseId,
    id: ResourceId,
    resource: Arc<R>,
    acquired_at: Instant,
}

impl<R> ResourceHandle<R> {
    pub(crate) fn new(pool: PoolId, lease: LeaseId, slot: &Slot<R>) -> Self {
        Self {
            pool,
            lease,
            id: slot.id,
            resource: Arc::clone(&slot.resource),
            acquired_at: Instant::now(),
        }
    }

    /// Get a reference to the resource
    pub fn get(&self) -> &R {
        &self.resource
    }

    /// The resource's identity
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// The lease this handle was issued under
    pub fn lease(&self) -> LeaseId {
        self.lease
    }

    /// The pool that issued this handle
    pub fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Get the time since this resource was acquired
    pub fn held_duration(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl<R> Clone for ResourceHandle<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            lease: self.lease,
            id: self.id,
            resource: Arc::clone(&self.resource),
            acquired_at: self.acquired_at,
        }
    }
}

impl<R> Deref for ResourceHandle<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R> fmt::Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("pool", &self.pool)
            .field("lease", &self.lease)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(u32);

    #[test]
    fn test_ids_display_with_prefix() {
        assert_eq!(ResourceId::new(4).to_string(), "resource-4");
        assert_eq!(LeaseId::new(9).to_string(), "lease-9");
        assert_eq!(PoolId::new(2).to_string(), "pool-2");
    }

    #[test]
    fn test_pool_ids_are_unique() {
        let a = PoolId::next();
        let b = PoolId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invoke_converts_panic() {
        let err = invoke("update", || panic!("boom")).unwrap_err();
        assert_eq!(err.message(), "update panicked: boom");

        let err = invoke("activate", || Err(ResourceError::new("refused"))).unwrap_err();
        assert_eq!(err.message(), "refused");
    }

    #[test]
    fn test_panic_message_handles_formatted_payloads() {
        let id = 7;
        let payload = panic::catch_unwind(|| panic!("resource {} lost", id)).unwrap_err();
        assert_eq!(panic_message(&*payload), "resource 7 lost");

        let payload = panic::catch_unwind(|| panic!("plain")).unwrap_err();
        assert_eq!(panic_message(&*payload), "plain");

        let payload = panic::catch_unwind(|| std::panic::panic_any(42u32)).unwrap_err();
        assert_eq!(panic_message(&*payload), "<unknown panic>");
    }

    #[test]
    fn test_handle_clones_share_lease_and_resource() {
        let slot = Slot::new(ResourceId::new(1), Marker(42));
        let handle = ResourceHandle::new(PoolId::new(1), LeaseId::new(5), &slot);
        let clone = handle.clone();

        assert_eq!(clone.lease(), LeaseId::new(5));
        assert_eq!(clone.id(), ResourceId::new(1));
        assert_eq!(clone.get().0, 42);
        assert!(Arc::ptr_eq(&handle.resource, &slot.resource));
        assert!(Arc::ptr_eq(&clone.resource, &slot.resource));
    }
}

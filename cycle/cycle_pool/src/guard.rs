//! Scoped leases.

use crate::error::{PoolError, Result, UsageError};
use crate::pool::Pool;
use crate::resource::{Resource, ResourceHandle};
use log::{debug, warn};
use std::fmt;
use std::ops::Deref;

/// A lease on a pooled resource that is released when dropped
///
/// Errors from the implicit release are logged. Use
/// [`ResourceGuard::release`] to observe them instead.
pub struct ResourceGuard<'a, R: Resource> {
    pool: &'a Pool<R>,
    handle: ResourceHandle<R>,
    released: bool,
}

impl<'a, R: Resource> ResourceGuard<'a, R> {
    pub(crate) fn new(pool: &'a Pool<R>, handle: ResourceHandle<R>) -> Self {
        Self {
            pool,
            handle,
            released: false,
        }
    }

    /// The handle behind this lease
    pub fn handle(&self) -> &ResourceHandle<R> {
        &self.handle
    }

    /// Release the resource now, reporting any failure
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.pool.release(&self.handle)
    }
}

impl<R: Resource> Deref for ResourceGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.handle
    }
}

impl<R: Resource> Drop for ResourceGuard<'_, R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        match self.pool.release(&self.handle) {
            Ok(()) => {}
            // Already force-released by shutdown.
            Err(PoolError::Usage(UsageError::NotActive { .. })) if !self.pool.is_running() => {
                debug!("Lease {} ended after pool shutdown", self.handle.lease());
            }
            Err(e) => warn!("Failed to release {}: {}", self.handle.id(), e),
        }
    }
}

impl<R: Resource> fmt::Debug for ResourceGuard<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("handle", &self.handle)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PoolConfig;
    use crate::error::{PoolError, ResourceError};
    use crate::pool::Pool;
    use crate::resource::Resource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        deactivations: AtomicUsize,
    }

    impl Resource for Counter {
        fn activate(&self) -> Result<(), ResourceError> {
            Ok(())
        }

        fn deactivate(&self) -> Result<(), ResourceError> {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn update(&self) -> Result<(), ResourceError> {
            Ok(())
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let pool: Pool<Counter> = Pool::new(PoolConfig::fixed(1)).unwrap();

        let handle = {
            let guard = pool.lease().unwrap();
            assert_eq!(pool.active_count(), 1);
            guard.handle().clone()
        };

        assert_eq!(pool.active_count(), 0);
        assert_eq!(handle.deactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_is_not_repeated() {
        let pool: Pool<Counter> = Pool::new(PoolConfig::fixed(1)).unwrap();
        let guard = pool.lease().unwrap();
        let handle = guard.handle().clone();

        guard.release().unwrap();
        assert_eq!(handle.deactivations.load(Ordering::SeqCst), 1);
        assert_eq!(pool.stats().released, 1);
    }

    #[test]
    fn test_guard_outliving_shutdown() {
        let pool: Pool<Counter> = Pool::new(PoolConfig::fixed(1)).unwrap();
        let guard = pool.lease().unwrap();

        assert_eq!(pool.shutdown().force_released, 1);
        assert_eq!(guard.deactivations.load(Ordering::SeqCst), 1);
        assert!(matches!(guard.release(), Err(PoolError::Usage(_))));
    }
}

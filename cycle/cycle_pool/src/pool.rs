//! The resource pool.
//!
//! Every resource the pool owns sits in exactly one of two collections: the
//! free queue or the active map. All moves between them, the running flag
//! and the counters are guarded by a single lock, which the updater also
//! takes for each pass. Waiting acquirers sleep on a condition variable tied
//! to that lock.
//!
//! `activate`, `deactivate` and `update` are called with the lock held. A
//! slow `update` therefore delays every acquire and release for the length
//! of the updater pass; keep resource callbacks short.

use crate::config::PoolConfig;
use crate::error::{PoolError, Result, UsageError};
use crate::guard::ResourceGuard;
use crate::resource::{invoke, LeaseId, PoolId, Resource, ResourceHandle, ResourceId, Slot};
use crate::stats::PoolStats;
use crate::updater::Updater;
use log::{debug, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Membership and bookkeeping guarded by the pool lock
pub(crate) struct PoolState<R> {
    /// Resources ready to be acquired, oldest release first
    pub(crate) free: VecDeque<Slot<R>>,

    /// Checked-out resources by lease
    pub(crate) active: HashMap<LeaseId, Slot<R>>,

    /// Cleared once shutdown begins
    pub(crate) running: bool,

    pub(crate) stats: PoolStats,

    next_resource: u64,
    next_lease: u64,
}

impl<R> PoolState<R> {
    fn new(capacity: usize) -> Self {
        Self {
            free: VecDeque::with_capacity(capacity),
            active: HashMap::with_capacity(capacity),
            running: true,
            stats: PoolStats::default(),
            next_resource: 1,
            next_lease: 1,
        }
    }

    fn create(&mut self, factory: &(dyn Fn() -> R + Send + Sync)) -> Slot<R> {
        let id = ResourceId::new(self.next_resource);
        self.next_resource += 1;
        self.stats.created += 1;
        Slot::new(id, factory())
    }

    fn issue_lease(&mut self) -> LeaseId {
        let lease = LeaseId::new(self.next_lease);
        self.next_lease += 1;
        lease
    }
}

/// State shared between the pool and its updater thread
pub(crate) struct Shared<R> {
    pub(crate) state: Mutex<PoolState<R>>,

    /// Signalled when a resource rejoins the free set, and on shutdown
    released: Condvar,

    /// Wakes the updater out of its inter-pass wait on shutdown
    pub(crate) updater_signal: Condvar,
}

/// How long an acquisition is willing to wait for a free resource
#[derive(Clone, Copy)]
enum Wait {
    Never,
    Forever,
    Until { deadline: Instant, timeout: Duration },
}

/// What shutdown did with the resources it found
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Resources that were still active and were deactivated by the pool
    pub force_released: usize,

    /// Resources dropped by the pool
    pub destroyed: usize,
}

/// A pool of reusable resources with a background updater
///
/// Share it between threads by reference (for example with
/// [`std::thread::scope`]) or behind an `Arc`. Dropping the pool shuts it
/// down; [`Pool::shutdown`] does the same explicitly and also wakes callers
/// blocked in [`Pool::acquire`].
pub struct Pool<R: Resource> {
    id: PoolId,
    config: PoolConfig,
    shared: Arc<Shared<R>>,
    factory: Box<dyn Fn() -> R + Send + Sync>,

    /// Present until shutdown has joined the updater
    updater: Mutex<Option<Updater>>,
}

impl<R: Resource + Default> Pool<R> {
    /// Create a pool whose resources are built with `R::default()`
    pub fn new(config: PoolConfig) -> Result<Self> {
        Self::with_factory(config, R::default)
    }
}

impl<R: Resource> Pool<R> {
    /// Create a pool that builds resources with `factory`
    ///
    /// `config.initial_size` resources are created up front and the updater
    /// thread is started before this returns. The factory is also called
    /// under the pool lock whenever a growable pool runs dry, so it must be
    /// cheap and must not touch the pool.
    pub fn with_factory<F>(config: PoolConfig, factory: F) -> Result<Self>
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        let id = PoolId::next();
        info!(
            "Initializing {} resource pool {} with {} resources",
            if config.growable { "growable" } else { "fixed" },
            id,
            config.initial_size
        );

        let factory: Box<dyn Fn() -> R + Send + Sync> = Box::new(factory);
        let mut state = PoolState::new(config.initial_size);
        for _ in 0..config.initial_size {
            let slot = state.create(&*factory);
            state.free.push_back(slot);
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            released: Condvar::new(),
            updater_signal: Condvar::new(),
        });

        let updater = Updater::spawn(Arc::clone(&shared), &config).map_err(PoolError::Spawn)?;

        Ok(Self {
            id,
            config,
            shared,
            factory,
            updater: Mutex::new(Some(updater)),
        })
    }

    /// Acquire a resource, waiting for a release if the pool is fixed and empty
    ///
    /// A growable pool never waits; it creates a resource instead. Returns
    /// [`PoolError::ShutDown`] if the pool is shut down before a resource
    /// could be handed out.
    pub fn acquire(&self) -> Result<ResourceHandle<R>> {
        self.acquire_inner(Wait::Forever)
    }

    /// Acquire a resource without waiting
    ///
    /// Returns [`PoolError::Exhausted`] if the pool is fixed and nothing is free.
    pub fn try_acquire(&self) -> Result<ResourceHandle<R>> {
        self.acquire_inner(Wait::Never)
    }

    /// Acquire a resource, waiting at most `timeout` for a release
    ///
    /// A timeout too large to be represented as a deadline waits like
    /// [`Pool::acquire`].
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<ResourceHandle<R>> {
        let wait = match Instant::now().checked_add(timeout) {
            Some(deadline) => Wait::Until { deadline, timeout },
            None => Wait::Forever,
        };
        self.acquire_inner(wait)
    }

    /// Acquire a resource wrapped in a guard that releases it when dropped
    pub fn lease(&self) -> Result<ResourceGuard<'_, R>> {
        Ok(ResourceGuard::new(self, self.acquire()?))
    }

    fn acquire_inner(&self, wait: Wait) -> Result<ResourceHandle<R>> {
        let mut state = self.shared.state.lock();
        let mut waited = false;

        let slot = loop {
            if !state.running {
                return Err(PoolError::ShutDown);
            }

            if let Some(slot) = state.free.pop_front() {
                break slot;
            }

            if self.config.growable {
                let slot = state.create(&*self.factory);
                debug!(
                    "Pool {} grew to {} resources",
                    self.id, state.stats.created
                );
                break slot;
            }

            let deadline = match wait {
                Wait::Never => return Err(PoolError::Exhausted),
                Wait::Forever => None,
                Wait::Until { deadline, timeout } => {
                    if Instant::now() >= deadline {
                        return Err(PoolError::Timeout(timeout));
                    }
                    Some(deadline)
                }
            };

            if !waited {
                trace!("Pool {}: waiting for a released resource", self.id);
                state.stats.waits += 1;
                waited = true;
            }

            // Woken by a release, by shutdown or spuriously; the loop re-checks.
            match deadline {
                Some(deadline) => {
                    self.shared.released.wait_until(&mut state, deadline);
                }
                None => self.shared.released.wait(&mut state),
            }
        };

        let id = slot.id;
        if let Err(source) = invoke("activate", || slot.resource.activate()) {
            warn!("Pool {}: {} failed to activate: {}", self.id, id, source);
            state.stats.activate_failures += 1;
            state.free.push_front(slot);
            self.shared.released.notify_one();
            return Err(PoolError::Activate { id, source });
        }

        let lease = state.issue_lease();
        let handle = ResourceHandle::new(self.id, lease, &slot);
        state.active.insert(lease, slot);
        state.stats.acquired += 1;

        trace!("Pool {}: {} acquired under {}", self.id, id, lease);
        Ok(handle)
    }

    /// Return an acquired resource to the pool
    ///
    /// The resource is deactivated, moved to the back of the free queue and
    /// one waiting acquirer is woken. A handle from another pool, or one
    /// whose lease was already released, is rejected with
    /// [`PoolError::Usage`] and leaves the pool untouched. If `deactivate`
    /// fails the resource is still returned to the free set and the failure
    /// is reported as [`PoolError::Deactivate`].
    pub fn release(&self, handle: &ResourceHandle<R>) -> Result<()> {
        if handle.pool_id() != self.id {
            return Err(UsageError::ForeignHandle {
                expected: self.id,
                found: handle.pool_id(),
            }
            .into());
        }

        let mut state = self.shared.state.lock();
        let slot = state
            .active
            .remove(&handle.lease())
            .ok_or(UsageError::NotActive {
                lease: handle.lease(),
                id: handle.id(),
            })?;

        let id = slot.id;
        let outcome = invoke("deactivate", || slot.resource.deactivate());
        state.free.push_back(slot);
        state.stats.released += 1;
        self.shared.released.notify_one();

        trace!("Pool {}: {} released from {}", self.id, id, handle.lease());

        outcome.map_err(|source| {
            warn!("Pool {}: {} failed to deactivate: {}", self.id, id, source);
            state.stats.deactivate_failures += 1;
            PoolError::Deactivate { id, source }
        })
    }

    /// Shut the pool down
    ///
    /// Wakes every blocked acquirer with [`PoolError::ShutDown`], stops and
    /// joins the updater, deactivates every resource that is still active and
    /// drops all resources. Callers must have stopped using their handles.
    /// Calling this more than once is harmless; later calls report nothing.
    pub fn shutdown(&self) -> ShutdownReport {
        let mut updater = self.updater.lock();
        let Some(running_updater) = updater.take() else {
            return ShutdownReport::default();
        };

        info!("Shutting down resource pool {}...", self.id);

        self.shared.state.lock().running = false;
        self.shared.released.notify_all();
        self.shared.updater_signal.notify_all();

        running_updater.join();

        let mut state = self.shared.state.lock();
        let forgotten: Vec<_> = state.active.drain().collect();
        let force_released = forgotten.len();

        for (lease, slot) in forgotten {
            debug!("Pool {}: force-releasing {} from {}", self.id, slot.id, lease);
            if let Err(e) = invoke("deactivate", || slot.resource.deactivate()) {
                warn!("Pool {}: {} failed to deactivate: {}", self.id, slot.id, e);
                state.stats.deactivate_failures += 1;
            }
            state.stats.force_released += 1;
            state.free.push_back(slot);
        }

        let free = std::mem::take(&mut state.free);
        drop(state);

        let destroyed = free.len();
        drop(free);

        info!(
            "Resource pool {} shutdown complete ({} force-released, {} destroyed)",
            self.id, force_released, destroyed
        );

        ShutdownReport {
            force_released,
            destroyed,
        }
    }

    /// This pool's identity
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The configuration the pool was built with
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Whether `acquire` grows the pool instead of waiting
    pub fn is_growable(&self) -> bool {
        self.config.growable
    }

    /// Whether the pool is still accepting acquisitions
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Get the current number of free resources
    pub fn free_count(&self) -> usize {
        self.shared.state.lock().free.len()
    }

    /// Get the current number of checked-out resources
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active.len()
    }

    /// Get the total number of resources (free + active)
    pub fn total_count(&self) -> usize {
        let state = self.shared.state.lock();
        state.free.len() + state.active.len()
    }

    /// Get a snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        self.shared.state.lock().stats.clone()
    }

    #[cfg(test)]
    pub(crate) fn updater_is_alive(&self) -> bool {
        self.updater
            .lock()
            .as_ref()
            .is_some_and(|updater| updater.is_alive())
    }
}

impl<R: Resource> Drop for Pool<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<R: Resource> fmt::Debug for Pool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("growable", &self.config.growable)
            .field("running", &state.running)
            .field("free", &state.free.len())
            .field("active", &state.active.len())
            .finish()
    }
}

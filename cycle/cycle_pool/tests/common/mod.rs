//! Shared test resource that records every transition it goes through.

#![allow(dead_code)]

use cycle_pool::{Pool, PoolConfig, Resource, ResourceError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters summed over every recorder built by one factory
#[derive(Debug, Default)]
pub struct Tally {
    pub created: AtomicUsize,
    pub activations: AtomicUsize,
    pub deactivations: AtomicUsize,
    pub updates: AtomicUsize,
    pub idle_updates: AtomicUsize,
}

pub struct Recorder {
    tally: Arc<Tally>,
    active: AtomicBool,
    pub activations: AtomicUsize,
    pub deactivations: AtomicUsize,
    pub updates: AtomicUsize,
    /// Set by the test while it believes it owns the resource
    pub held: AtomicBool,
    /// Makes the next `activate` fail, once
    pub fail_next_activate: AtomicBool,
    pub fail_deactivate: AtomicBool,
}

impl Recorder {
    fn new(tally: Arc<Tally>) -> Self {
        tally.created.fetch_add(1, Ordering::SeqCst);
        Self {
            tally,
            active: AtomicBool::new(false),
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            fail_next_activate: AtomicBool::new(false),
            fail_deactivate: AtomicBool::new(false),
        }
    }
}

impl Resource for Recorder {
    fn activate(&self) -> Result<(), ResourceError> {
        if self.fail_next_activate.swap(false, Ordering::SeqCst) {
            return Err(ResourceError::new("activation refused"));
        }
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(ResourceError::new("activated twice"));
        }
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.tally.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deactivate(&self) -> Result<(), ResourceError> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(ResourceError::new("deactivated while idle"));
        }
        if self.fail_deactivate.load(Ordering::SeqCst) {
            return Err(ResourceError::new("deactivation refused"));
        }
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.tally.deactivations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn update(&self) -> Result<(), ResourceError> {
        if !self.active.load(Ordering::SeqCst) {
            self.tally.idle_updates.fetch_add(1, Ordering::SeqCst);
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.tally.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn load(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Build a pool of recorders that all report into one tally
pub fn recording_pool(config: PoolConfig) -> (Pool<Recorder>, Arc<Tally>) {
    let tally = Arc::new(Tally::default());
    let factory_tally = Arc::clone(&tally);
    let pool = Pool::with_factory(
        config.with_update_interval(Duration::from_millis(1)),
        move || Recorder::new(Arc::clone(&factory_tally)),
    )
    .unwrap();
    (pool, tally)
}

/// Poll `condition` until it holds or `timeout` passes
pub fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

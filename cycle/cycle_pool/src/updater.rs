//! Background updater for the active set.
//!
//! One thread per pool. Each pass takes the pool lock, calls `update()` on
//! every active resource and then waits on the updater condition variable
//! for the configured interval, which releases the lock until the next pass.
//! Shutdown clears the running flag and signals the condition variable, so
//! the thread exits without sleeping out the rest of its interval.

use crate::config::PoolConfig;
use crate::pool::{PoolState, Shared};
use crate::resource::{invoke, panic_message, Resource};
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Handle to a running updater thread
pub(crate) struct Updater {
    handle: JoinHandle<()>,
}

impl Updater {
    /// Start the updater thread for `shared`
    pub(crate) fn spawn<R: Resource>(
        shared: Arc<Shared<R>>,
        config: &PoolConfig,
    ) -> std::io::Result<Self> {
        let interval = config.effective_update_interval();
        if interval != config.update_interval {
            warn!(
                "Update interval {:?} is out of range, using {:?}",
                config.update_interval, interval
            );
        }

        let handle = thread::Builder::new()
            .name(config.updater_thread_name.clone())
            .spawn(move || run(&shared, interval))?;

        Ok(Self { handle })
    }

    /// Wait for the thread to exit; the running flag must already be cleared
    pub(crate) fn join(self) {
        if let Err(payload) = self.handle.join() {
            error!("Updater thread panicked: {}", panic_message(&*payload));
        }
    }

    #[cfg(test)]
    pub(crate) fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Updater thread main loop
fn run<R: Resource>(shared: &Shared<R>, interval: Duration) {
    debug!("Updater: starting (interval {:?})", interval);

    let mut state = shared.state.lock();
    while state.running {
        update_pass(&mut state);

        match Instant::now().checked_add(interval) {
            Some(deadline) => {
                while state.running
                    && !shared
                        .updater_signal
                        .wait_until(&mut state, deadline)
                        .timed_out()
                {}
            }
            // Unreachable with a clamped interval; wait for shutdown.
            None => shared.updater_signal.wait(&mut state),
        }
    }

    debug!("Updater: shutting down");
}

/// Call `update()` once on every active resource
///
/// A failing or panicking resource is logged and counted; the pass goes on
/// with the rest.
fn update_pass<R: Resource>(state: &mut PoolState<R>) {
    let PoolState { active, stats, .. } = state;

    for (lease, slot) in active.iter() {
        stats.update_calls += 1;
        if let Err(e) = invoke("update", || slot.resource.update()) {
            stats.update_failures += 1;
            warn!("Updater: {} ({}) failed to update: {}", slot.id, lease, e);
        }
    }

    stats.update_passes += 1;
    trace!("Updater: pass over {} active resources", active.len());
}

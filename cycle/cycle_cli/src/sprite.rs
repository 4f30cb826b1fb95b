//! Demo resource: a sprite that advances one frame per update while active.

use cycle_pool::{Resource, ResourceError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared by every sprite of one run
#[derive(Debug, Default)]
pub struct SpriteTotals {
    pub spawned: AtomicU64,
    pub shown: AtomicU64,
    pub hidden: AtomicU64,
    pub frames: AtomicU64,
}

pub struct Sprite {
    totals: Arc<SpriteTotals>,
    visible: AtomicBool,
    frame: AtomicU64,
}

impl Sprite {
    pub fn spawn(totals: Arc<SpriteTotals>) -> Self {
        totals.spawned.fetch_add(1, Ordering::Relaxed);
        Self {
            totals,
            visible: AtomicBool::new(false),
            frame: AtomicU64::new(0),
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }
}

impl Resource for Sprite {
    fn activate(&self) -> Result<(), ResourceError> {
        if self.visible.swap(true, Ordering::AcqRel) {
            return Err(ResourceError::new("sprite is already visible"));
        }
        self.frame.store(0, Ordering::Relaxed);
        self.totals.shown.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn deactivate(&self) -> Result<(), ResourceError> {
        if !self.visible.swap(false, Ordering::AcqRel) {
            return Err(ResourceError::new("sprite is already hidden"));
        }
        self.totals.hidden.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn update(&self) -> Result<(), ResourceError> {
        self.frame.fetch_add(1, Ordering::Relaxed);
        self.totals.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

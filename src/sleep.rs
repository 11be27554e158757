// src/sleep.rs
// Pluggable blocking wait between attempts

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Performs the wait between two attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, wait: Duration);
}

/// Blocks the calling thread for the full wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, wait: Duration) {
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

/// Records every requested wait and returns immediately.
///
/// Clones share the same record, so a test can keep one handle and hand the
/// other to a policy.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        match self.waits.lock() {
            Ok(waits) => waits.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn total(&self) -> Duration {
        self.waits().into_iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, wait: Duration) {
        match self.waits.lock() {
            Ok(mut waits) => waits.push(wait),
            Err(poisoned) => poisoned.into_inner().push(wait),
        }
    }
}

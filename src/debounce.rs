//! Single-slot debounce for keyword searches.
//!
//! Every `schedule` bumps a generation counter and aborts the task in the slot,
//! whether it is still sleeping or already running its callback. A timer that
//! wakes up re-checks its generation under the same lock before it starts, so
//! once `schedule` has returned no older callback can start, and one that had
//! started is stopped at its next await point.

use crate::models::ResultLimit;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Default)]
struct Slot {
    generation: u64,
    task: Option<JoinHandle<()>>,
    running: bool,
}

impl Slot {
    fn abort_current(&mut self) -> bool {
        self.running = false;
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SearchDebouncer {
    runtime: Handle,
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl SearchDebouncer {
    pub fn new(runtime: Handle, delay: Duration) -> Self {
        Self {
            runtime,
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Run `callback(query, limit)` once the input has been quiet for the delay,
    /// replacing whatever search was waiting.
    pub fn schedule<F, Fut>(&self, query: String, limit: ResultLimit, callback: F)
    where
        F: FnOnce(String, ResultLimit) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        if slot.abort_current() {
            log::debug!("Superseded previous search");
        }

        let shared = Arc::clone(&self.slot);
        let delay = self.delay;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.running = true;
            }
            log::debug!("Running debounced search for {:?}", query);
            callback(query, limit).await;

            let mut slot = lock(&shared);
            if slot.generation == generation {
                slot.task = None;
                slot.running = false;
            }
        });
        // Still holding the lock: the task can't touch the slot before this lands.
        slot.task = Some(task);
    }

    /// Drop the waiting or running search, if any.
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        slot.abort_current();
    }

    /// A search is waiting out the delay.
    pub fn is_pending(&self) -> bool {
        let slot = lock(&self.slot);
        slot.task.is_some() && !slot.running
    }

    /// A search has started and not finished yet.
    pub fn is_running(&self) -> bool {
        lock(&self.slot).running
    }
}

//! One-shot deferred actions keyed by document name.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of arming a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Armed {
    /// No timer was pending for the name.
    New,
    /// A pending timer for the name was cancelled and replaced.
    Replaced,
}

struct PendingTimer {
    id: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct TimerTable {
    next_id: u64,
    pending: HashMap<String, PendingTimer>,
}

/// Registry of per-name timers, each running on its own tokio task.
///
/// A timer leaves the registry the moment it fires, before its action runs,
/// so a running action can never be aborted by a later [`ExpiryScheduler::arm`].
/// Timers have no ordering guarantee relative to each other.
#[derive(Default)]
pub struct ExpiryScheduler {
    table: Arc<Mutex<TimerTable>>,
    shutdown: CancellationToken,
}

fn lock_table(table: &Mutex<TimerTable>) -> MutexGuard<'_, TimerTable> {
    // The table holds no invariants a panicking holder could break halfway.
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExpiryScheduler {
    /// Run `action` once `delay` has elapsed, unless the scheduler is shut down first.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// - `name`: Key of the timer; arming an existing key replaces it.
    /// - `delay`: Time until the action runs.
    /// - `action`: Deferred work.
    ///
    /// # Returns
    /// Whether a pending timer for `name` was replaced.
    pub fn arm<F>(&self, name: &str, delay: Duration, action: F) -> Armed
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut table = lock_table(&self.table);
        let id = table.next_id;
        table.next_id += 1;

        let registry = Arc::clone(&self.table);
        let shutdown = self.shutdown.clone();
        let key = name.to_string();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            {
                let mut table = lock_table(&registry);
                match table.pending.get(&key) {
                    Some(timer) if timer.id == id => {
                        table.pending.remove(&key);
                    }
                    _ => return,
                }
            }
            action.await;
        });

        let previous = table.pending.insert(
            name.to_string(),
            PendingTimer {
                id,
                handle: task.abort_handle(),
            },
        );
        match previous {
            Some(timer) => {
                timer.handle.abort();
                Armed::Replaced
            }
            None => Armed::New,
        }
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        lock_table(&self.table).pending.len()
    }

    /// Whether a timer is pending for `name`.
    pub fn is_pending(&self, name: &str) -> bool {
        lock_table(&self.table).pending.contains_key(name)
    }

    /// Cancel every pending timer without running its action.
    ///
    /// # Returns
    /// The number of timers cancelled.
    pub fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        let mut table = lock_table(&self.table);
        let cancelled = table.pending.len();
        for (_, timer) in table.pending.drain() {
            timer.handle.abort();
        }
        cancelled
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::{Armed, ExpiryScheduler};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_action(fired: &Arc<AtomicUsize>) -> impl std::future::Future<Output = ()> {
        let fired = fired.clone();
        async move {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay_and_leaves_registry() {
        let scheduler = ExpiryScheduler::default();
        let fired = Arc::new(AtomicUsize::new(0));

        let armed = scheduler.arm("doc", Duration::from_secs(60), counting_action(&fired));
        assert_eq!(armed, Armed::New);
        assert!(scheduler.is_pending("doc"));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_pending_timer() {
        let scheduler = ExpiryScheduler::default();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.arm("doc", Duration::from_secs(10), counting_action(&fired));
        let armed = scheduler.arm("doc", Duration::from_secs(30), counting_action(&fired));
        assert_eq!(armed, Armed::Replaced);
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timers() {
        let scheduler = ExpiryScheduler::default();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.arm("a", Duration::from_secs(5), counting_action(&fired));
        scheduler.arm("b", Duration::from_secs(5), counting_action(&fired));
        assert_eq!(scheduler.shutdown(), 2);
        assert_eq!(scheduler.pending(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

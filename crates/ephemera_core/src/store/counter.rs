//! Advisory live-document counter used for admission control.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts documents with an armed deletion.
///
/// Incremented once when a deletion is armed and decremented once when it
/// fires, so increments and decrements always balance over time.
#[derive(Debug, Default)]
pub struct DocumentCounter {
    count: AtomicUsize,
}

impl DocumentCounter {
    /// Current count.
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Record one more live document.
    ///
    /// # Returns
    /// The count after the increment.
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record one fewer live document, saturating at zero.
    ///
    /// # Returns
    /// The count after the decrement.
    pub fn decrement(&self) -> usize {
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_sub(1))
            })
            .unwrap_or_else(|count| count);
        previous.saturating_sub(1)
    }

    /// Whether the count has reached `max`.
    ///
    /// Uses `>=` since documents recovered at startup may push the count past
    /// the configured maximum.
    pub fn is_at_capacity(&self, max: usize) -> bool {
        self.get() >= max
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentCounter;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn decrement_saturates_at_zero() {
        let counter = DocumentCounter::default();
        assert_eq!(counter.decrement(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.decrement(), 0);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn capacity_check_tolerates_overshoot() {
        let counter = DocumentCounter::default();
        for _ in 0..5 {
            counter.increment();
        }
        assert!(counter.is_at_capacity(3));
        assert!(counter.is_at_capacity(5));
        assert!(!counter.is_at_capacity(6));
    }

    #[test]
    fn concurrent_updates_do_not_drift() {
        let counter = Arc::new(DocumentCounter::default());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment();
                        counter.decrement();
                    }
                    for _ in 0..10 {
                        counter.increment();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker join");
        }
        assert_eq!(counter.get(), 80);
    }
}

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Counted completion barrier.
///
/// Every unit of work holds a [`LatchTicket`] for as long as it is alive; the
/// latch counts outstanding tickets and [`CompletionLatch::wait`] blocks until
/// none remain. Unlike polling a queue for emptiness this also covers work that
/// has already been dequeued but is still executing.
#[derive(Clone, Default)]
pub struct CompletionLatch {
    inner: Arc<LatchInner>,
}

#[derive(Default)]
struct LatchInner {
    outstanding: Mutex<usize>,
    released: Condvar,
}

/// Held by one unit of outstanding work. Dropping it counts the latch down.
#[must_use = "the latch counts down as soon as the ticket is dropped"]
pub struct LatchTicket {
    inner: Arc<LatchInner>,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more unit of outstanding work.
    pub fn ticket(&self) -> LatchTicket {
        *self.inner.lock() += 1;
        LatchTicket {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of tickets currently alive.
    pub fn outstanding(&self) -> usize {
        *self.inner.lock()
    }

    /// Block until every ticket issued so far has been dropped.
    pub fn wait(&self) {
        let guard = self.inner.lock();
        let _guard = self
            .inner
            .released
            .wait_while(guard, |outstanding| *outstanding > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    /// Returns `true` if the latch reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock();
        while *guard > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            guard = self
                .inner
                .released
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

impl LatchInner {
    // The counter is a plain integer, so a poisoned lock still holds a valid value.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.outstanding.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LatchTicket {
    fn drop(&mut self) {
        let mut outstanding = self.inner.lock();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.inner.released.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_returns_immediately_without_tickets() {
        let latch = CompletionLatch::new();
        latch.wait();
        assert_eq!(latch.outstanding(), 0);
    }

    #[test]
    fn test_tickets_are_counted() {
        let latch = CompletionLatch::new();
        let first = latch.ticket();
        let second = latch.ticket();
        assert_eq!(latch.outstanding(), 2);

        drop(first);
        assert_eq!(latch.outstanding(), 1);
        drop(second);
        assert_eq!(latch.outstanding(), 0);
    }

    #[test]
    fn test_wait_blocks_until_tickets_dropped() {
        let latch = CompletionLatch::new();
        let tickets: Vec<_> = (0..4).map(|_| latch.ticket()).collect();

        let handles: Vec<_> = tickets
            .into_iter()
            .enumerate()
            .map(|(i, ticket)| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10 * i as u64));
                    drop(ticket);
                })
            })
            .collect();

        latch.wait();
        assert_eq!(latch.outstanding(), 0);

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_wait_timeout_expires_with_live_ticket() {
        let latch = CompletionLatch::new();
        let _ticket = latch.ticket();
        assert!(!latch.wait_timeout(Duration::from_millis(20)));
    }
}

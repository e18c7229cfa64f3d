//! Interrupting a running cell.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Handle for interrupting cell execution from another task.
///
/// Clones share state: triggering any clone interrupts the cell currently
/// supervised by the kernel. The kernel resets the flag before each cell.
///
/// # Example
///
/// ```
/// use dkernel_core::execute::InterruptHandle;
///
/// let handle = InterruptHandle::new();
/// let remote = handle.clone();
///
/// assert!(!handle.is_interrupted());
/// remote.interrupt();
/// assert!(handle.is_interrupted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an interrupt. Idempotent.
    pub fn interrupt(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether an interrupt has been requested since the last reset.
    pub fn is_interrupted(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Clear a pending interrupt.
    pub fn reset(&self) {
        self.inner.flag.store(false, Ordering::SeqCst);
    }

    /// Resolve once an interrupt has been requested.
    pub async fn interrupted(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_interrupted() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_reset_clears_flag() {
        let handle = InterruptHandle::new();
        handle.interrupt();
        assert!(handle.is_interrupted());
        handle.reset();
        assert!(!handle.is_interrupted());
    }

    #[tokio::test]
    async fn test_interrupted_resolves_after_trigger() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();

        let waiter = tokio::spawn(async move { handle.interrupted().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        remote.interrupt();

        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("interrupt not observed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_already_interrupted_resolves_immediately() {
        let handle = InterruptHandle::new();
        handle.interrupt();
        tokio::time::timeout(Duration::from_millis(100), handle.interrupted())
            .await
            .unwrap();
    }
}

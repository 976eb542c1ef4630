//! Toast Queue
//!
//! Ordered collection of live toasts. Every toast owns exactly one pending
//! removal timer (a tokio task) stored in a map keyed by its id, so a manual
//! dismissal can cancel the timer instead of racing it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use super::toast::{DEFAULT_TTL, Severity, Toast, ToastId};

#[derive(Default)]
struct QueueState {
    /// Live toasts in insertion order
    toasts: Vec<Toast>,
    /// Pending removal timers, at most one per toast
    timers: HashMap<ToastId, AbortHandle>,
}

struct Inner {
    state: Mutex<QueueState>,
    updates: watch::Sender<Vec<Toast>>,
    default_ttl: Duration,
}

impl Inner {
    /// Removes a toast and cancels its timer. Removing an unknown id is a no-op.
    fn remove(&self, id: ToastId, cancel_timer: bool) -> bool {
        let mut state = self.state.lock();
        if let Some(timer) = state.timers.remove(&id) {
            if cancel_timer {
                timer.abort();
            }
        }
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id() != id);
        let removed = state.toasts.len() != before;
        if removed {
            self.updates.send_replace(state.toasts.clone());
        }
        removed
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, timer) in self.state.get_mut().timers.drain() {
            timer.abort();
        }
    }
}

/// Transient notification queue shared by every part of the client.
///
/// Cloning is cheap; clones share the same queue. Scheduling a toast spawns a
/// tokio task, so `show_toast` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Inner>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ToastQueue {
    /// Create an empty queue whose toasts live `default_ttl` unless told otherwise
    pub fn new(default_ttl: Duration) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                updates,
                default_ttl,
            }),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// Append a toast and schedule its removal at `now + ttl`.
    ///
    /// Returns the freshly generated id of the new toast.
    pub fn show_toast(
        &self,
        message: impl Into<String>,
        severity: Severity,
        ttl: Option<Duration>,
    ) -> ToastId {
        let ttl = ttl.unwrap_or(self.inner.default_ttl);
        let toast = Toast::new(message, severity, ttl);
        let id = toast.id();
        let deadline = toast.expires_at();

        debug!("Showing {} toast {} for {:?}", severity, id, ttl);

        {
            let mut state = self.inner.state.lock();
            state.toasts.push(toast);
            self.inner.updates.send_replace(state.toasts.clone());
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                if inner.remove(id, false) {
                    debug!("Toast {} expired", id);
                }
            }
        });

        // A zero ttl may already have fired, or a dismiss may have won. Only a
        // toast that is still queued gets its timer recorded.
        let mut state = self.inner.state.lock();
        if state.toasts.iter().any(|t| t.id() == id) {
            state.timers.insert(id, timer.abort_handle());
        } else {
            timer.abort();
        }
        drop(state);

        id
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.show_toast(message, Severity::Success, None)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.show_toast(message, Severity::Error, None)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.show_toast(message, Severity::Info, None)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.show_toast(message, Severity::Warning, None)
    }

    /// Remove a toast immediately and cancel its pending timer.
    ///
    /// Returns `true` if the toast was still queued. Idempotent.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let removed = self.inner.remove(id, true);
        if removed {
            debug!("Toast {} dismissed", id);
        }
        removed
    }

    /// Remove every toast and cancel every pending timer
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        if !state.toasts.is_empty() {
            state.toasts.clear();
            self.inner.updates.send_replace(Vec::new());
        }
    }

    /// Snapshot of the live toasts in insertion order
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.state.lock().toasts.clone()
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.inner.state.lock().toasts.iter().any(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of removal timers still pending
    pub fn pending_timers(&self) -> usize {
        self.inner.state.lock().timers.len()
    }

    /// Receive a fresh snapshot every time the queue changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn show_toast_appends_in_order() {
        let queue = ToastQueue::default();
        let first = queue.info("first");
        let second = queue.success("second");
        let third = queue.warning("third");

        let ids: Vec<_> = queue.toasts().iter().map(Toast::id).collect();
        assert_eq!(ids, vec![first, second, third]);
        assert_eq!(queue.toasts()[0].ttl(), DEFAULT_TTL);
    }

    #[tokio::test(start_paused = true)]
    async fn toast_expires_without_dismiss() {
        let queue = ToastQueue::default();
        let id = queue.show_toast("x", Severity::Info, Some(Duration::from_millis(100)));
        assert!(queue.contains(id));

        tokio::time::sleep(Duration::from_millis(99)).await;
        settle().await;
        assert!(queue.contains(id));

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        assert!(!queue.contains(id));
        assert_eq!(queue.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_keeps_remaining_order() {
        let queue = ToastQueue::default();
        let a = queue.show_toast("a", Severity::Info, Some(Duration::from_millis(300)));
        let b = queue.show_toast("b", Severity::Info, Some(Duration::from_millis(100)));
        let c = queue.show_toast("c", Severity::Info, Some(Duration::from_millis(300)));

        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;

        let ids: Vec<_> = queue.toasts().iter().map(Toast::id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(!queue.contains(b));
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_cancels_timer_and_is_idempotent() {
        let queue = ToastQueue::default();
        let id = queue.show_toast("bye", Severity::Error, Some(Duration::from_millis(100)));

        assert!(queue.dismiss(id));
        assert_eq!(queue.pending_timers(), 0);
        assert!(!queue.dismiss(id));
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dismissed_timer_never_removes_a_later_toast() {
        let queue = ToastQueue::default();
        let old = queue.show_toast("old", Severity::Info, Some(Duration::from_millis(100)));
        queue.dismiss(old);

        let new = queue.show_toast("new", Severity::Info, Some(Duration::from_millis(500)));
        assert_ne!(old, new);

        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;
        assert!(queue.contains(new));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_after_expiry_is_a_noop() {
        let queue = ToastQueue::default();
        let id = queue.show_toast("late", Severity::Info, Some(Duration::from_millis(10)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        settle().await;
        assert!(!queue.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_every_timer() {
        let queue = ToastQueue::new(Duration::from_millis(50));
        queue.info("a");
        queue.error("b");
        assert_eq!(queue.pending_timers(), 2);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);

        let later = queue.info("c");
        tokio::time::sleep(Duration::from_millis(10)).await;
        settle().await;
        assert!(queue.contains(later));
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_every_change() {
        let queue = ToastQueue::default();
        let mut rx = queue.subscribe();

        let id = queue.success("saved");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        queue.dismiss(id);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_the_same_queue() {
        let queue = ToastQueue::default();
        let handle = queue.clone();
        let id = handle.warning("shared");
        assert!(queue.contains(id));
        assert!(queue.dismiss(id));
        assert!(handle.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_ttl_keeps_toast_until_dismissed() {
        let queue = ToastQueue::new(Duration::MAX);
        let pinned = queue.show_toast("pinned", Severity::Info, Some(Duration::MAX));
        let default = queue.info("default");

        tokio::time::sleep(Duration::from_secs(3600)).await;
        settle().await;
        assert!(queue.contains(pinned));
        assert!(queue.contains(default));

        assert!(queue.dismiss(pinned));
        queue.clear();
        assert_eq!(queue.pending_timers(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn zero_ttl_expires_on_a_threaded_runtime() {
        let queue = ToastQueue::default();
        for _ in 0..32 {
            queue.show_toast("blink", Severity::Info, Some(Duration::ZERO));
        }

        for _ in 0..200 {
            if queue.is_empty() && queue.pending_timers() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);
    }
}

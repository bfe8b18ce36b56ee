//! Mute-state observers.
//!
//! UI elements that show a mute toggle subscribe here. Notification runs
//! synchronously on the thread that changed the mute state, over a
//! snapshot of the registry taken with no lock held.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked with the new muted value.
pub type MuteListener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, MuteListener)>,
}

/// Ordered set of mute listeners.
#[derive(Default)]
pub(crate) struct MuteListeners {
    registry: Mutex<Registry>,
}

impl MuteListeners {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a listener and returns its subscription.
    pub(crate) fn subscribe(self: &Arc<Self>, listener: MuteListener) -> MuteSubscription {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, listener));

        MuteSubscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut registry = self.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(entry_id, _)| *entry_id != id);
        registry.entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.lock().entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    /// Calls every listener, in subscription order, with `muted`.
    ///
    /// Delivery stops as soon as `is_current` returns false. Listeners added
    /// or removed by a listener take effect from the next notification.
    pub(crate) fn notify(&self, muted: bool, is_current: impl Fn() -> bool) {
        let snapshot: Vec<MuteListener> = self
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if !is_current() {
                break;
            }
            listener(muted);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub(crate) fn clear(&self) {
        self.lock().entries.clear();
    }
}

/// Registration returned by `AudioSession::subscribe_mute`.
///
/// Dropping it does not unsubscribe; call [`MuteSubscription::unsubscribe`].
#[must_use = "call unsubscribe() to stop receiving mute changes"]
#[derive(Debug)]
pub struct MuteSubscription {
    id: u64,
    listeners: Weak<MuteListeners>,
}

impl MuteSubscription {
    /// Removes exactly this listener.
    ///
    /// Returns false if it was already gone (e.g. the session shut down).
    pub fn unsubscribe(self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.remove(self.id))
    }

    /// Returns true while the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.contains(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(log: &Arc<Mutex<Vec<(usize, bool)>>>, tag: usize) -> MuteListener {
        let log = Arc::clone(log);
        Arc::new(move |muted| log.lock().unwrap().push((tag, muted)))
    }

    #[test]
    fn test_notify_in_subscription_order() {
        let listeners = Arc::new(MuteListeners::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        let _a = listeners.subscribe(recorder(&log, 1));
        let _b = listeners.subscribe(recorder(&log, 2));
        listeners.notify(true, || true);

        assert_eq!(*log.lock().unwrap(), vec![(1, true), (2, true)]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let listeners = Arc::new(MuteListeners::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = listeners.subscribe(recorder(&log, 1));
        let b = listeners.subscribe(recorder(&log, 2));
        assert!(a.unsubscribe());
        listeners.notify(false, || true);

        assert_eq!(*log.lock().unwrap(), vec![(2, false)]);
        assert!(b.is_active());
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_notify_stops_once_value_is_stale() {
        let listeners = Arc::new(MuteListeners::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let current = Arc::new(std::sync::atomic::AtomicBool::new(true));

        let _a = listeners.subscribe({
            let current = Arc::clone(&current);
            Arc::new(move |_| current.store(false, Ordering::SeqCst))
        });
        let _b = listeners.subscribe(recorder(&log, 2));
        listeners.notify(true, || current.load(Ordering::SeqCst));

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_same_closure_subscribed_twice() {
        let listeners = Arc::new(MuteListeners::default());
        let count = Arc::new(AtomicUsize::new(0));
        let listener: MuteListener = {
            let count = Arc::clone(&count);
            Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        let first = listeners.subscribe(Arc::clone(&listener));
        let _second = listeners.subscribe(listener);
        assert!(first.unsubscribe());
        listeners.notify(true, || true);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_after_clear() {
        let listeners = Arc::new(MuteListeners::default());
        let sub = listeners.subscribe(Arc::new(|_| {}));
        listeners.clear();

        assert!(!sub.is_active());
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let listeners = Arc::new(MuteListeners::default());
        let sub = listeners.subscribe(Arc::new(|_| {}));
        drop(listeners);

        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_listener_may_subscribe_during_notify() {
        let listeners = Arc::new(MuteListeners::default());
        let count = Arc::new(AtomicUsize::new(0));

        let _sub = listeners.subscribe({
            let weak = Arc::downgrade(&listeners);
            let count = Arc::clone(&count);
            Arc::new(move |_| {
                if let Some(listeners) = weak.upgrade() {
                    let count = Arc::clone(&count);
                    let _late = listeners.subscribe(Arc::new(move |_| {
                        count.fetch_add(1, Ordering::SeqCst);
                    }));
                }
            })
        });

        listeners.notify(true, || true);
        // The listener added during notification is not called this round.
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(listeners.len(), 2);
    }
}

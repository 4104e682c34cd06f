//! Subscriber-based notifications for dictionary reloads.

use crate::core::DictionarySnapshot;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

type Callback = Box<dyn Fn(&DictionarySnapshot) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
pub struct SubscriptionHandle {
    id: usize,
    registry: Weak<RwLock<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let id = self.id;
            registry
                .write()
                .subscribers
                .retain(|(sub_id, _)| *sub_id != id);
        }
    }
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Arc<Callback>)>,
    next_id: usize,
}

/// Registry for callbacks invoked whenever a new snapshot is published.
///
/// Callbacks run on the monitor's worker after the swap, so they must not
/// block for long. A panicking callback is logged and skipped; the remaining
/// callbacks still run.
///
/// # Examples
///
/// ```rust
/// use hotswap_dict::core::DictionarySnapshot;
/// use hotswap_dict::notify::SubscriberRegistry;
///
/// let registry = SubscriberRegistry::new();
/// let handle = registry.subscribe(|snapshot: &DictionarySnapshot| {
///     println!("dictionary now has {} entries", snapshot.len());
/// });
///
/// registry.notify_all(&DictionarySnapshot::empty());
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<RwLock<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register `callback`. Returns a handle that unsubscribes on drop.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&DictionarySnapshot) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(Box::new(callback))));

        SubscriptionHandle {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every callback, in subscription order, with `snapshot`.
    ///
    /// Returns the number of callbacks that panicked.
    pub fn notify_all(&self, snapshot: &DictionarySnapshot) -> usize {
        // Clone out so a callback may subscribe or unsubscribe without deadlocking.
        let callbacks: Vec<Arc<Callback>> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        let mut panicked = 0;
        for callback in callbacks {
            let result = panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot)));
            if result.is_err() {
                panicked += 1;
                tracing::error!(entries = snapshot.len(), "reload subscriber panicked");
            }
        }
        panicked
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_and_notify() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let snapshot = DictionarySnapshot::empty();
        registry.notify_all(&snapshot);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.notify_all(&snapshot);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_sees_snapshot() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        let _handle = registry.subscribe(move |snapshot| {
            seen_clone.store(snapshot.len(), Ordering::SeqCst);
        });

        registry.notify_all(&DictionarySnapshot::parse_str("a=b\nc=d\n"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_callback_does_not_stop_others() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let _panics = registry.subscribe(|_| panic!("subscriber failure"));
        let counter_clone = Arc::clone(&counter);
        let _counts = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.notify_all(&DictionarySnapshot::empty()), 1);
        assert_eq!(registry.notify_all(&DictionarySnapshot::empty()), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let snapshot = DictionarySnapshot::empty();
        registry.notify_all(&snapshot);
        drop(handle);
        registry.notify_all(&snapshot);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = SubscriberRegistry::new();
        let handle = registry.subscribe(|_| {});
        drop(registry);
        drop(handle);
    }

    #[test]
    fn test_clone_registry() {
        let registry = SubscriberRegistry::new();
        let registry2 = registry.clone();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry2.notify_all(&DictionarySnapshot::empty());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry2.subscriber_count(), 1);
    }
}

//! The shared dictionary handle providing lock-free access.

use crate::core::DictionarySnapshot;
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// The shared, hot-swappable dictionary reference.
///
/// Uses `arc-swap` internally: any number of tokenizer threads can read the
/// current snapshot without locking while the monitor publishes a new one.
/// A reader always sees one complete snapshot, never a mix of old and new
/// entries.
///
/// Cloning the handle is cheap and every clone observes the same snapshot.
///
/// # Examples
///
/// ```rust
/// use hotswap_dict::prelude::*;
///
/// let dictionary = HotswapDictionary::new(DictionarySnapshot::parse_str("行=xíng háng\n"));
///
/// // Zero-cost read
/// let snapshot = dictionary.get();
/// assert!(snapshot.contains_key("行"));
/// ```
pub struct HotswapDictionary {
    /// The current snapshot, wrapped in ArcSwap for atomic updates
    current: Arc<ArcSwap<DictionarySnapshot>>,
    /// Subscriber registry for reload notifications
    subscribers: SubscriberRegistry,
}

impl HotswapDictionary {
    /// Create a handle holding `initial` as the active snapshot.
    pub fn new(initial: DictionarySnapshot) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Get a reference-counted handle to the current snapshot.
    ///
    /// Lock-free; never blocks on, or is blocked by, a reload in progress.
    /// Hold the returned `Arc` for the duration of one tokenization pass so
    /// that every lookup in that pass hits the same snapshot.
    pub fn get(&self) -> Arc<DictionarySnapshot> {
        self.current.load_full()
    }

    /// Atomically replace the active snapshot and notify subscribers.
    ///
    /// The previous snapshot is freed once the last reader drops it.
    pub fn publish(&self, snapshot: DictionarySnapshot) -> Arc<DictionarySnapshot> {
        let snapshot = self.store(snapshot);
        self.notify(&snapshot);
        snapshot
    }

    /// Swap in `snapshot` without notifying subscribers.
    pub(crate) fn store(&self, snapshot: DictionarySnapshot) -> Arc<DictionarySnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    pub(crate) fn notify(&self, snapshot: &DictionarySnapshot) {
        self.subscribers.notify_all(snapshot);
    }

    /// Subscribe to reloads.
    ///
    /// The callback receives each newly published snapshot. Drop the
    /// returned handle to unsubscribe.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hotswap_dict::prelude::*;
    ///
    /// let dictionary = HotswapDictionary::new(DictionarySnapshot::empty());
    /// let handle = dictionary.subscribe(|snapshot| {
    ///     println!("reloaded: {} entries", snapshot.len());
    /// });
    ///
    /// dictionary.publish(DictionarySnapshot::parse_str("行=xíng\n"));
    /// drop(handle);
    /// ```
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&DictionarySnapshot) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Number of active reload subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.subscriber_count()
    }
}

impl Default for HotswapDictionary {
    fn default() -> Self {
        Self::new(DictionarySnapshot::empty())
    }
}

impl Clone for HotswapDictionary {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            subscribers: self.subscribers.clone(),
        }
    }
}

use super::subscription::{Callback, Listener, ListenerKind, Selector, Subscription, SubscriptionId};
use crate::value::{strictly_equal, Value, Values};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

// A panicking callback must not wedge the store for everyone else.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared state behind every clone of a [`GlobalStore`].
pub(crate) struct StoreInner {
    values: Mutex<Arc<Values>>,
    // BTreeMap keeps listeners in subscription order
    listeners: Mutex<BTreeMap<SubscriptionId, Listener>>,
    next_id: AtomicU64,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            values: Mutex::new(Arc::new(Values::default())),
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        lock(&self.listeners).contains_key(&id)
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        // The record is dropped after the lock is released: its callback
        // may own another Subscription whose drop re-enters here.
        let removed = lock(&self.listeners).remove(&id);
        let found = removed.is_some();
        drop(removed);

        if found {
            trace!(%id, "listener detached");
        }
        found
    }
}

/// A keyed value store with change notification.
///
/// Clones are cheap and share the same state, so a store can be handed to
/// every consumer that needs it.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tincan_global::{GlobalStore, Value};
///
/// let store = GlobalStore::new();
/// let calls = Arc::new(AtomicUsize::new(0));
///
/// let _subscription = store.subscribe("count", {
///     let calls = calls.clone();
///     move || {
///         calls.fetch_add(1, Ordering::SeqCst);
///     }
/// });
///
/// store.publish("count", Value::new(1));
/// store.publish("count", Value::new(1));
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct GlobalStore {
    inner: Arc<StoreInner>,
}

impl GlobalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner::new()),
        }
    }

    /// Register a listener for writes to `key`.
    ///
    /// The listener remembers the value currently stored under `key` and is
    /// only called when a later write is not strictly equal to the last
    /// value it saw. Any number of listeners may share a key.
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let key = key.into();
        let previous = self.values().get(&key).cloned();
        self.attach(ListenerKind::Keyed { key, previous }, Arc::new(callback))
    }

    /// Register a listener for a value derived from the whole map.
    ///
    /// `selector` runs once now to capture the starting value, then after
    /// every publish to any key. The callback fires when the result is not
    /// strictly equal to the previous one.
    pub fn subscribe_with_selector<S, F>(&self, selector: S, callback: F) -> Subscription
    where
        S: Fn(&Values) -> Value + Send + Sync + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        let selector: Selector = Arc::new(selector);
        let previous = selector(&*self.values());
        self.attach(ListenerKind::Selector { selector, previous }, Arc::new(callback))
    }

    fn attach(&self, kind: ListenerKind, callback: Callback) -> Subscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        match &kind {
            ListenerKind::Keyed { key, .. } => trace!(%id, key = %key, "keyed listener attached"),
            ListenerKind::Selector { .. } => trace!(%id, "selector listener attached"),
        }
        lock(&self.inner.listeners).insert(id, Listener { kind, callback });
        Subscription::new(id, &self.inner)
    }

    /// Store `value` under `key` and notify listeners that observe a change.
    ///
    /// Storage is always updated, even when the value is strictly equal to
    /// the one already held. Keyed listeners on other keys are skipped
    /// without evaluation; every selector listener is re-evaluated.
    ///
    /// Notification is synchronous and no lock is held while callbacks run,
    /// so a callback may subscribe, unsubscribe or publish again. Listeners
    /// attached during this call are not visited by it. Nothing guards
    /// against a callback that keeps publishing new values forever.
    pub fn publish(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let replaced = Arc::make_mut(&mut *lock(&self.inner.values)).insert(key.clone(), value.clone());
        drop(replaced);

        let ids: Vec<SubscriptionId> = lock(&self.inner.listeners).keys().copied().collect();
        debug!(key = %key, listeners = ids.len(), "publishing value");

        for id in ids {
            if let Some(callback) = self.changed(id, &key, &value) {
                trace!(%id, key = %key, "notifying listener");
                callback();
            }
        }
    }

    /// Decide whether listener `id` observes a change, recording the new
    /// observed value if so.
    fn changed(&self, id: SubscriptionId, key: &str, value: &Value) -> Option<Callback> {
        let mut listeners = lock(&self.inner.listeners);
        let listener = listeners.get_mut(&id)?;
        let selector = match &mut listener.kind {
            ListenerKind::Keyed {
                key: listened,
                previous,
            } => {
                if listened.as_str() != key || strictly_equal(previous.as_ref(), Some(value)) {
                    return None;
                }
                *previous = Some(value.clone());
                return Some(Arc::clone(&listener.callback));
            }
            ListenerKind::Selector { selector, .. } => Arc::clone(selector),
        };
        drop(listeners);

        // Run the selector unlocked against the latest map. Earlier callbacks
        // of this publish may have written to it.
        let next = selector(&*self.values());

        let mut listeners = lock(&self.inner.listeners);
        let listener = listeners.get_mut(&id)?;
        match &mut listener.kind {
            ListenerKind::Selector { previous, .. } if !previous.strictly_equals(&next) => {
                *previous = next;
                Some(Arc::clone(&listener.callback))
            }
            _ => None,
        }
    }

    /// Accessor for the value under `key`.
    ///
    /// The first call that finds `key` absent stores `initial` there. Every
    /// call returns whatever is currently stored.
    pub fn get_snapshot(
        &self,
        key: impl Into<String>,
        initial: Value,
    ) -> impl Fn() -> Value + Send + Sync + 'static {
        let store = self.clone();
        let key = key.into();
        move || store.read_or_seed(&key, &initial)
    }

    /// Accessor that runs `selector` over the current map on every call.
    pub fn get_snapshot_with_selector<S>(&self, selector: S) -> impl Fn() -> Value + Send + Sync + 'static
    where
        S: Fn(&Values) -> Value + Send + Sync + 'static,
    {
        let store = self.clone();
        move || selector(&*store.values())
    }

    pub(crate) fn read_or_seed(&self, key: &str, initial: &Value) -> Value {
        let mut values = lock(&self.inner.values);
        if let Some(value) = values.get(key) {
            return value.clone();
        }
        debug!(key = %key, "seeding key with its initial value");
        Arc::make_mut(&mut *values).insert(key, initial.clone());
        initial.clone()
    }

    /// The current contents of the store.
    ///
    /// The returned map is immutable; later publishes do not affect it.
    pub fn values(&self) -> Arc<Values> {
        Arc::clone(&lock(&self.inner.values))
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }
}

impl Default for GlobalStore {
    fn default() -> Self {
        Self::new()
    }
}

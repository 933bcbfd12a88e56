use crate::store::{lock, GlobalStore, Subscription};
use crate::value::{Value, Values};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Callback a framework hands to [`ExternalStore::subscribe`].
pub type Notify = Arc<dyn Fn() + Send + Sync>;

type Snapshot = Arc<dyn Fn() -> Value + Send + Sync>;
type Selector = Arc<dyn Fn(&Values) -> Value + Send + Sync>;

/// The subscription contract a rendering framework expects from external state.
pub trait ExternalStore {
    /// Attach `notify`; the returned guard detaches it.
    fn subscribe(&self, notify: Notify) -> Subscription;

    /// Read the current state.
    fn get_snapshot(&self) -> Value;

    /// Read the state used before the UI becomes interactive.
    ///
    /// Defaults to [`ExternalStore::get_snapshot`].
    fn get_server_snapshot(&self) -> Value {
        self.get_snapshot()
    }
}

/// One key of a store, seeded with an initial value on first read.
#[derive(Clone)]
pub struct KeyedSource {
    store: GlobalStore,
    key: String,
    snapshot: Snapshot,
}

impl KeyedSource {
    /// The key this source reads and subscribes to.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ExternalStore for KeyedSource {
    fn subscribe(&self, notify: Notify) -> Subscription {
        self.store.subscribe(self.key.clone(), move || notify())
    }

    fn get_snapshot(&self) -> Value {
        (self.snapshot)()
    }
}

/// A value derived from the whole store by a selector.
#[derive(Clone)]
pub struct SelectorSource {
    store: GlobalStore,
    selector: Selector,
    snapshot: Snapshot,
}

impl ExternalStore for SelectorSource {
    fn subscribe(&self, notify: Notify) -> Subscription {
        let selector = Arc::clone(&self.selector);
        self.store
            .subscribe_with_selector(move |values| selector(values), move || notify())
    }

    fn get_snapshot(&self) -> Value {
        (self.snapshot)()
    }
}

impl GlobalStore {
    /// Expose `key` through the external-store contract.
    ///
    /// The same snapshot function serves both the live and the server
    /// snapshot.
    pub fn keyed_source(&self, key: impl Into<String>, initial: Value) -> KeyedSource {
        let key = key.into();
        KeyedSource {
            store: self.clone(),
            snapshot: Arc::new(self.get_snapshot(key.clone(), initial)),
            key,
        }
    }

    /// Expose a derived value through the external-store contract.
    pub fn selector_source<S>(&self, selector: S) -> SelectorSource
    where
        S: Fn(&Values) -> Value + Send + Sync + 'static,
    {
        let selector: Selector = Arc::new(selector);
        let snapshot_selector = Arc::clone(&selector);
        SelectorSource {
            store: self.clone(),
            snapshot: Arc::new(self.get_snapshot_with_selector(move |values| snapshot_selector(values))),
            selector,
        }
    }
}

/// Framework-side state for one consumer of an [`ExternalStore`].
///
/// Holds the last snapshot the consumer rendered. A notification triggers a
/// fresh snapshot read, and `rerender` runs only when that read is not
/// strictly equal to the cached one, so redundant notifications never cost
/// a render. Dropping the `SyncedStore` detaches it.
pub struct SyncedStore<S> {
    source: S,
    current: Arc<Mutex<Value>>,
    _subscription: Subscription,
}

impl<S> SyncedStore<S>
where
    S: ExternalStore + Clone + Send + Sync + 'static,
{
    /// Read the live snapshot, then subscribe.
    pub fn mount<R>(source: S, rerender: R) -> Self
    where
        R: Fn() + Send + Sync + 'static,
    {
        let initial = source.get_snapshot();
        Self::attach(source, initial, rerender)
    }

    /// Read the server snapshot, then subscribe and catch up with the live
    /// snapshot.
    pub fn hydrate<R>(source: S, rerender: R) -> Self
    where
        R: Fn() + Send + Sync + 'static,
    {
        let initial = source.get_server_snapshot();
        Self::attach(source, initial, rerender)
    }

    fn attach<R>(source: S, initial: Value, rerender: R) -> Self
    where
        R: Fn() + Send + Sync + 'static,
    {
        let current = Arc::new(Mutex::new(initial));
        let rerender: Notify = Arc::new(rerender);

        let check: Notify = {
            let source = source.clone();
            let current = Arc::clone(&current);
            Arc::new(move || {
                if refresh(&current, source.get_snapshot()) {
                    trace!("snapshot changed, scheduling re-render");
                    rerender();
                }
            })
        };

        let subscription = source.subscribe(Arc::clone(&check));

        // A write may have landed between the first read and subscribing.
        check();

        Self {
            source,
            current,
            _subscription: subscription,
        }
    }

    /// The render read: fetch the live snapshot and cache it.
    pub fn snapshot(&self) -> Value {
        let next = self.source.get_snapshot();
        refresh(&self.current, next.clone());
        next
    }

    /// The last snapshot seen, without reading the source.
    pub fn cached(&self) -> Value {
        lock(&self.current).clone()
    }
}

/// Store `next` if it differs from the cached value; report whether it did.
fn refresh(current: &Mutex<Value>, next: Value) -> bool {
    let mut current = lock(current);
    if current.strictly_equals(&next) {
        return false;
    }
    *current = next;
    true
}

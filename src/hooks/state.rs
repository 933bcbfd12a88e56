use crate::error::StoreError;
use crate::store::{lock, GlobalStore};
use crate::sync::{ExternalStore, KeyedSource, SyncedStore};
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, Mutex};

/// New state for [`SetGlobalState::set`]: a literal value or an updater.
pub enum SetStateAction<T> {
    /// Replace the state with this value.
    Value(T),
    /// Compute the new state from the most recently rendered one.
    Update(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> SetStateAction<T> {
    /// Wrap an updater closure.
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        SetStateAction::Update(Box::new(f))
    }

    fn resolve(self, latest: &T) -> T {
        match self {
            SetStateAction::Value(value) => value,
            SetStateAction::Update(f) => f(latest),
        }
    }
}

impl<T> From<T> for SetStateAction<T> {
    fn from(value: T) -> Self {
        SetStateAction::Value(value)
    }
}

impl<T> fmt::Debug for SetStateAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetStateAction::Value(_) => f.write_str("SetStateAction::Value(..)"),
            SetStateAction::Update(_) => f.write_str("SetStateAction::Update(..)"),
        }
    }
}

type Rendered<T> = Arc<Mutex<Arc<T>>>;

/// Read side of [`use_global_state`] and [`use_global_state_shared`].
///
/// Stays subscribed to its key until dropped.
pub struct GlobalState<T> {
    key: String,
    synced: SyncedStore<KeyedSource>,
    rendered: Rendered<T>,
}

impl<T> GlobalState<T>
where
    T: Send + Sync + 'static,
{
    /// Read the current value for rendering.
    ///
    /// The value read here is what updaters passed to the setter receive.
    /// For shared state the returned `Arc` is the very allocation that was
    /// published.
    pub fn get(&self) -> Result<Arc<T>, StoreError> {
        let value = self.synced.snapshot().downcast_for::<T>(&self.key)?;
        *lock(&self.rendered) = Arc::clone(&value);
        Ok(value)
    }

    /// The key this state is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Write side of [`use_global_state`]. Cheap to clone.
///
/// Values compare by content: setting an equal value notifies nobody.
pub struct SetGlobalState<T> {
    store: GlobalStore,
    key: String,
    rendered: Rendered<T>,
}

impl<T> Clone for SetGlobalState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            rendered: Arc::clone(&self.rendered),
        }
    }
}

impl<T> SetGlobalState<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    /// Publish a new value for the key.
    ///
    /// Listeners are notified before this returns, including the
    /// component's own subscription. A panicking updater propagates and
    /// leaves the store untouched.
    pub fn set(&self, action: impl Into<SetStateAction<T>>) {
        // Release the lock before running the updater.
        let latest = Arc::clone(&lock(&self.rendered));
        let action: SetStateAction<T> = action.into();
        let next = action.resolve(&latest);
        self.store.publish(self.key.clone(), Value::new(next));
    }

    /// Shorthand for `set(SetStateAction::update(f))`.
    pub fn set_with<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        self.set(SetStateAction::update(f));
    }
}

/// Write side of [`use_global_state_shared`]. Cheap to clone.
///
/// Values compare by allocation: every fresh `Arc` notifies, while
/// re-setting the handle already stored notifies nobody, even if its
/// contents were mutated in place.
pub struct SetSharedState<T> {
    store: GlobalStore,
    key: String,
    rendered: Rendered<T>,
}

impl<T> Clone for SetSharedState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            rendered: Arc::clone(&self.rendered),
        }
    }
}

impl<T> SetSharedState<T>
where
    T: Send + Sync + 'static,
{
    /// Publish a new handle for the key.
    pub fn set(&self, action: impl Into<SetStateAction<Arc<T>>>) {
        let latest = Arc::clone(&*lock(&self.rendered));
        let action: SetStateAction<Arc<T>> = action.into();
        let next = action.resolve(&latest);
        self.store.publish(self.key.clone(), Value::shared(next));
    }

    /// Shorthand for `set(SetStateAction::update(f))`.
    pub fn set_with<F>(&self, f: F)
    where
        F: FnOnce(&Arc<T>) -> Arc<T> + Send + 'static,
    {
        self.set(SetStateAction::update(f));
    }
}

/// Seed, read and subscribe; shared by both flavours of the hook.
fn bind<T, R>(
    store: &GlobalStore,
    key: String,
    initial: Value,
    rerender: R,
) -> Result<(GlobalState<T>, Rendered<T>), StoreError>
where
    T: Send + Sync + 'static,
    R: Fn() + Send + Sync + 'static,
{
    let source = store.keyed_source(key.clone(), initial);
    let first = source.get_snapshot().downcast_for::<T>(&key)?;
    let synced = SyncedStore::mount(source, rerender);
    let rendered = Arc::new(Mutex::new(first));

    let state = GlobalState {
        key,
        synced,
        rendered: Arc::clone(&rendered),
    };
    Ok((state, rendered))
}

/// Bind a component to `key` in `store`.
///
/// Seeds `key` with `initial` if nothing is stored there yet, subscribes,
/// and returns the read and write halves. `rerender` runs whenever the
/// value under `key` changes. Values compare by content; use
/// [`use_global_state_shared`] for state that should compare by identity.
///
/// Fails if `key` already holds a value of another type.
///
/// # Examples
///
/// ```
/// use tincan_global::{use_global_state, GlobalStore};
///
/// let store = GlobalStore::new();
/// let (count, set_count) = use_global_state(&store, "count", 0, || {}).unwrap();
/// let (other, _) = use_global_state(&store, "count", 100, || {}).unwrap();
///
/// set_count.set_with(|n| n + 1);
/// assert_eq!(*count.get().unwrap(), 1);
/// assert_eq!(*other.get().unwrap(), 1);
/// ```
pub fn use_global_state<T, R>(
    store: &GlobalStore,
    key: impl Into<String>,
    initial: T,
    rerender: R,
) -> Result<(GlobalState<T>, SetGlobalState<T>), StoreError>
where
    T: PartialEq + Send + Sync + 'static,
    R: Fn() + Send + Sync + 'static,
{
    let key = key.into();
    let (state, rendered) = bind(store, key.clone(), Value::new(initial), rerender)?;
    let setter = SetGlobalState {
        store: store.clone(),
        key,
        rendered,
    };
    Ok((state, setter))
}

/// Bind a component to `key` in `store`, comparing values by identity.
///
/// Like [`use_global_state`], but the state is a shared allocation and
/// `T` needs no `PartialEq`. A change is a different `Arc`, never a
/// different content.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tincan_global::{use_global_state_shared, GlobalStore};
///
/// let store = GlobalStore::new();
/// let initial = Arc::new(Mutex::new(vec![1]));
/// let (list, set_list) = use_global_state_shared(&store, "list", initial, || {}).unwrap();
///
/// set_list.set(Arc::new(Mutex::new(vec![1, 2])));
/// assert_eq!(list.get().unwrap().lock().unwrap().len(), 2);
/// ```
pub fn use_global_state_shared<T, R>(
    store: &GlobalStore,
    key: impl Into<String>,
    initial: Arc<T>,
    rerender: R,
) -> Result<(GlobalState<T>, SetSharedState<T>), StoreError>
where
    T: Send + Sync + 'static,
    R: Fn() + Send + Sync + 'static,
{
    let key = key.into();
    let (state, rendered) = bind(store, key.clone(), Value::shared(initial), rerender)?;
    let setter = SetSharedState {
        store: store.clone(),
        key,
        rendered,
    };
    Ok((state, setter))
}

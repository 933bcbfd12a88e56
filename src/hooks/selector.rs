use crate::store::GlobalStore;
use crate::sync::{SelectorSource, SyncedStore};
use crate::value::{Value, Values};
use std::sync::Arc;

/// Read-only value derived from a whole store.
///
/// Stays subscribed until dropped.
pub struct GlobalSelector<T> {
    store: GlobalStore,
    selector: Arc<dyn Fn(&Values) -> T + Send + Sync>,
    _synced: SyncedStore<SelectorSource>,
}

impl<T> GlobalSelector<T> {
    /// Run the selector over the current store contents.
    ///
    /// Nothing is cached: every call recomputes.
    pub fn get(&self) -> T {
        (self.selector)(&*self.store.values())
    }
}

/// Bind a component to a value derived from every key in `store`.
///
/// The selector re-runs after each publish to any key; `rerender` runs only
/// when its result changes.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tincan_global::{use_global_selector, GlobalStore, Value};
///
/// let store = GlobalStore::new();
/// let renders = Arc::new(AtomicUsize::new(0));
///
/// let total = use_global_selector(
///     &store,
///     |values| {
///         let a = values.get_as::<i32>("a").map_or(0, |v| *v);
///         let b = values.get_as::<i32>("b").map_or(0, |v| *v);
///         a + b
///     },
///     {
///         let renders = renders.clone();
///         move || {
///             renders.fetch_add(1, Ordering::SeqCst);
///         }
///     },
/// );
///
/// store.publish("a", Value::new(2));
/// store.publish("b", Value::new(3));
/// assert_eq!(total.get(), 5);
/// assert_eq!(renders.load(Ordering::SeqCst), 2);
/// ```
pub fn use_global_selector<T, S, R>(store: &GlobalStore, selector: S, rerender: R) -> GlobalSelector<T>
where
    T: PartialEq + Send + Sync + 'static,
    S: Fn(&Values) -> T + Send + Sync + 'static,
    R: Fn() + Send + Sync + 'static,
{
    let selector: Arc<dyn Fn(&Values) -> T + Send + Sync> = Arc::new(selector);
    bind(store, selector, Value::new, rerender)
}

/// Like [`use_global_selector`], but the derived value is a shared
/// allocation compared by identity.
///
/// `rerender` runs when the selector hands back a different `Arc`, whatever
/// its contents.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tincan_global::{use_global_selector_shared, GlobalStore, Value};
///
/// let store = GlobalStore::new();
/// let empty = Arc::new(Vec::<i32>::new());
/// let list = use_global_selector_shared(
///     &store,
///     move |values| values.get_as::<Vec<i32>>("list").unwrap_or_else(|| empty.clone()),
///     || {},
/// );
///
/// let items = Arc::new(vec![1, 2]);
/// store.publish("list", Value::shared(items.clone()));
/// assert!(Arc::ptr_eq(&list.get(), &items));
/// ```
pub fn use_global_selector_shared<T, S, R>(store: &GlobalStore, selector: S, rerender: R) -> GlobalSelector<Arc<T>>
where
    T: Send + Sync + 'static,
    S: Fn(&Values) -> Arc<T> + Send + Sync + 'static,
    R: Fn() + Send + Sync + 'static,
{
    let selector: Arc<dyn Fn(&Values) -> Arc<T> + Send + Sync> = Arc::new(selector);
    bind(store, selector, Value::shared, rerender)
}

fn bind<T, R>(
    store: &GlobalStore,
    selector: Arc<dyn Fn(&Values) -> T + Send + Sync>,
    erase: fn(T) -> Value,
    rerender: R,
) -> GlobalSelector<T>
where
    T: 'static,
    R: Fn() + Send + Sync + 'static,
{
    let erased = Arc::clone(&selector);
    let source = store.selector_source(move |values| erase(erased(values)));

    GlobalSelector {
        store: store.clone(),
        selector,
        _synced: SyncedStore::mount(source, rerender),
    }
}

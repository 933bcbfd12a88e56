use crate::store::GlobalStore;
use std::cell::RefCell;
use std::sync::OnceLock;

// Thread-local stack for scoped stores
thread_local! {
    static STORE_STACK: RefCell<Vec<GlobalStore>> = const { RefCell::new(Vec::new()) };
}

impl GlobalStore {
    /// Get or create the process-wide store.
    ///
    /// The store lives until the process exits. Prefer passing an explicit
    /// store around; this exists for code that has no other way to reach one.
    pub fn global() -> GlobalStore {
        static STORE: OnceLock<GlobalStore> = OnceLock::new();
        STORE.get_or_init(GlobalStore::new).clone()
    }
}

/// Resolution of the store that applies to the current thread.
///
/// Supports the process-wide store (default) and scoped stores for
/// isolation, which is mostly useful in tests.
///
/// # Examples
///
/// ```
/// use tincan_global::{GlobalStore, StoreContext, Value};
///
/// StoreContext::scope(|| {
///     StoreContext::current().publish("theme", Value::new("dark"));
///     assert!(StoreContext::current().values().contains_key("theme"));
/// });
/// // The scoped store and all its state is dropped here
/// assert!(!GlobalStore::global().values().contains_key("theme"));
/// ```
pub struct StoreContext;

impl StoreContext {
    /// Run a function with a fresh, empty store as the current one.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_store(GlobalStore::new(), f)
    }

    /// Get the current store (innermost scoped store, or the global one).
    pub fn current() -> GlobalStore {
        STORE_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(GlobalStore::global)
        })
    }

    /// Run a function with `store` as the current store.
    ///
    /// The store is pushed onto the thread-local stack for the duration of
    /// the call and popped again even if `f` panics.
    pub fn with_store<F, R>(store: GlobalStore, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        STORE_STACK.with(|stack| {
            stack.borrow_mut().push(store);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        STORE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Number of scoped stores active on this thread.
    pub fn depth() -> usize {
        STORE_STACK.with(|stack| stack.borrow().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn global_store_is_shared() {
        GlobalStore::global().publish("runtime::shared", Value::new(1));
        assert!(GlobalStore::global().values().contains_key("runtime::shared"));
    }

    #[test]
    fn scopes_nest_and_isolate() {
        StoreContext::scope(|| {
            StoreContext::current().publish("outer", Value::new(1));
            assert_eq!(StoreContext::depth(), 1);

            StoreContext::scope(|| {
                assert_eq!(StoreContext::depth(), 2);
                assert!(!StoreContext::current().values().contains_key("outer"));
            });

            assert!(StoreContext::current().values().contains_key("outer"));
        });
        assert_eq!(StoreContext::depth(), 0);
    }

    #[test]
    fn with_store_uses_given_store() {
        let store = GlobalStore::new();
        StoreContext::with_store(store.clone(), || {
            StoreContext::current().publish("k", Value::new(true));
        });
        assert!(store.values().contains_key("k"));
    }

    #[test]
    fn stack_unwinds_on_panic() {
        let result = std::panic::catch_unwind(|| {
            StoreContext::scope(|| panic!("boom"));
        });
        assert!(result.is_err());
        assert_eq!(StoreContext::depth(), 0);
    }
}

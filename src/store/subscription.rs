use crate::store::StoreInner;
use crate::value::{Value, Values};
use std::fmt;
use std::sync::{Arc, Weak};

pub(crate) type Callback = Arc<dyn Fn() + Send + Sync>;
pub(crate) type Selector = Arc<dyn Fn(&Values) -> Value + Send + Sync>;

/// Stable handle of a listener record inside a store.
///
/// Handles are never reused, so two records with identical contents are
/// still told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) enum ListenerKind {
    Keyed {
        key: String,
        // None until the key has been written
        previous: Option<Value>,
    },
    Selector {
        selector: Selector,
        previous: Value,
    },
}

pub(crate) struct Listener {
    pub(crate) kind: ListenerKind,
    pub(crate) callback: Callback,
}

/// RAII guard for a store listener.
///
/// The listener stays attached until [`Subscription::unsubscribe`] is
/// called or the guard is dropped, whichever comes first. Detaching twice,
/// or after the store itself is gone, does nothing.
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription {
    id: SubscriptionId,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, store: &Arc<StoreInner>) -> Self {
        Self {
            id,
            store: Arc::downgrade(store),
        }
    }

    /// Handle of the listener record this guard owns.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.contains(self.id))
    }

    /// Detach the listener. Safe to call from inside its own callback.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

use crate::error::StoreError;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Erased = dyn Any + Send + Sync;

#[derive(Clone, Copy)]
enum Equality {
    ByValue(fn(&Erased, &Erased) -> bool),
    ByIdentity,
}

fn compare_by_value<T: PartialEq + 'static>(a: &Erased, b: &Erased) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// A type-erased value held by the store.
///
/// Cloning a `Value` is cheap and keeps its identity: both clones point at
/// the same allocation.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tincan_global::Value;
///
/// // Primitive semantics: equal content means equal values.
/// assert!(Value::new(1).strictly_equals(&Value::new(1)));
///
/// // Shared semantics: only the same allocation is equal.
/// let list = Arc::new(Mutex::new(vec![1, 2]));
/// let a = Value::shared(list.clone());
/// let b = Value::shared(Arc::new(Mutex::new(vec![1, 2])));
/// assert!(a.strictly_equals(&a.clone()));
/// assert!(!a.strictly_equals(&b));
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Arc<Erased>,
    type_name: &'static str,
    equality: Equality,
}

impl Value {
    /// Wrap a value that compares by content.
    ///
    /// Use this for numbers, strings, flags and other plain data.
    pub fn new<T>(value: T) -> Self
    where
        T: PartialEq + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
            equality: Equality::ByValue(compare_by_value::<T>),
        }
    }

    /// Wrap a shared allocation that compares by identity.
    ///
    /// Re-publishing the same handle after mutating its contents in place
    /// is indistinguishable from publishing nothing new.
    pub fn shared<T>(value: Arc<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            inner: value,
            type_name: type_name::<T>(),
            equality: Equality::ByIdentity,
        }
    }

    /// Strict equality: same type and same content for primitive values,
    /// same allocation for shared ones. Mixed flavours are never equal.
    pub fn strictly_equals(&self, other: &Value) -> bool {
        match (self.equality, other.equality) {
            (Equality::ByValue(eq), Equality::ByValue(_)) => eq(&*self.inner, &*other.inner),
            (Equality::ByIdentity, Equality::ByIdentity) => Arc::ptr_eq(&self.inner, &other.inner),
            _ => false,
        }
    }

    /// Whether this value compares by identity.
    pub fn is_shared(&self) -> bool {
        matches!(self.equality, Equality::ByIdentity)
    }

    /// Name of the concrete type held.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the held value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared handle to the held value as `T`.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Like [`Value::downcast`], reporting a mismatch against `key`.
    pub(crate) fn downcast_for<T>(&self, key: &str) -> Result<Arc<T>, StoreError>
    where
        T: Send + Sync + 'static,
    {
        self.downcast::<T>().ok_or_else(|| StoreError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
            found: self.type_name,
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .field("shared", &self.is_shared())
            .finish()
    }
}

/// Strict equality where `None` stands for a key that was never written.
///
/// Two absent values are equal; an absent value never equals a present one.
pub fn strictly_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.strictly_equals(b),
        _ => false,
    }
}

/// Immutable view of every key in a store, as handed to selectors.
#[derive(Clone, Default, Debug)]
pub struct Values {
    entries: HashMap<String, Value>,
}

impl Values {
    /// Value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Value stored under `key` as `T`. `None` if absent or of another type.
    pub fn get_as<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.entries.get(key).and_then(Value::downcast::<T>)
    }

    /// Whether anything has been stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Every key written so far, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been written yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }
}

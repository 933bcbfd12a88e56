//! # Tincan Global
//!
//! Keyed global state shared across components, with change notification.
//!
//! ## Store (Low-level primitives)
//!
//! - `GlobalStore` - Key → value map with keyed and selector listeners
//! - `Value` - Opaque stored value with strict-equality change detection
//! - `Subscription` - Guard that detaches a listener when dropped
//!
//! ## Hooks (Component bindings)
//!
//! Accessors built on a UI framework's external-store contract:
//! - `use_global_state` - Read and write one key from any number of components
//! - `use_global_selector` - Read-only value derived from the whole store
//! - `use_global_state_shared` / `use_global_selector_shared` - The same over
//!   `Arc`s, compared by identity
//! - `SyncedStore` - Snapshot caching and deduplicated re-renders
//!
//! ## Change detection
//!
//! A listener only hears about a write when the new value is not strictly
//! equal to the last one it saw. Values made with [`Value::new`] compare by
//! content; values made with [`Value::shared`] compare by allocation, so
//! mutating shared data in place and re-publishing the same handle notifies
//! nobody.

pub mod error;
pub mod hooks;
pub mod runtime;
pub mod store;
pub mod sync;
pub mod value;

// Re-export main types for convenience
pub use error::StoreError;
pub use hooks::{
    use_global_selector, use_global_selector_shared, use_global_state, use_global_state_shared, GlobalSelector,
    GlobalState, SetGlobalState, SetSharedState, SetStateAction,
};
pub use runtime::StoreContext;
pub use store::{GlobalStore, Subscription, SubscriptionId};
pub use sync::{ExternalStore, KeyedSource, Notify, SelectorSource, SyncedStore};
pub use value::{strictly_equal, Value, Values};

//! Binding between a store and a UI framework's external-store contract.
//!
//! A framework that renders from external state needs two things from it:
//! a way to subscribe for change notifications and a way to read the
//! current snapshot. [`ExternalStore`] is that contract; [`SyncedStore`] is
//! the framework side of it, caching the last snapshot and asking for a
//! re-render only when it really changed.

mod external;

pub use external::{ExternalStore, KeyedSource, Notify, SelectorSource, SyncedStore};

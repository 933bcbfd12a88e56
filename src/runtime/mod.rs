//! Process-wide and scoped stores.
//!
//! This module provides the default store shared by the whole process and
//! a thread-local stack of scoped stores for isolation.

mod context;

pub use context::StoreContext;

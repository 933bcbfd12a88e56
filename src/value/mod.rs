//! Opaque shared values and the key → value map.
//!
//! The store never looks inside what it holds. Change detection relies on
//! strict equality, which comes in two flavours chosen when a value is
//! created: primitive values compare by content, shared values compare by
//! allocation.

mod value;

pub use value::{strictly_equal, Value, Values};

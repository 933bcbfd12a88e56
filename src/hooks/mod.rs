//! Component-facing accessors.
//!
//! - [`use_global_state`]: read and write one key, shared by every
//!   component that uses the same key
//! - [`use_global_selector`]: read-only value derived from the whole store
//!
//! Both compare values by content. The `_shared` variants work on `Arc`s
//! and compare by identity instead.

mod selector;
mod state;

pub use selector::{use_global_selector, use_global_selector_shared, GlobalSelector};
pub use state::{
    use_global_state, use_global_state_shared, GlobalState, SetGlobalState, SetSharedState, SetStateAction,
};

//! Keyed global state with change notification.
//!
//! A [`GlobalStore`] maps string keys to opaque [`Value`](crate::Value)s and
//! keeps an ordered list of listeners. Keyed listeners hear about writes to
//! one key; selector listeners hear about any write that changes their
//! derived value.

mod store;
mod subscription;

pub(crate) use store::{lock, StoreInner};
pub use store::GlobalStore;
pub use subscription::{Subscription, SubscriptionId};

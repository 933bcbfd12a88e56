//! Errors surfaced by typed store accessors.

use thiserror::Error;

/// Errors returned when reading typed state out of the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A key holds a value of a different concrete type than the reader asked for.
    #[error("key '{key}' holds a value of type {found}, expected {expected}")]
    TypeMismatch {
        /// Key that was read.
        key: String,
        /// Type requested by the reader.
        expected: &'static str,
        /// Type actually stored under the key.
        found: &'static str,
    },
}

//! Kernel module - server infrastructure and dependencies.

pub mod store;

pub use store::{EventStore, StoreError};

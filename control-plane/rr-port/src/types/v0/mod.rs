#![allow(clippy::derive_partial_eq_without_eq)]

/// All the control-plane resources which are persisted in the persistent store.
pub mod store;
/// All the "transport" types through which control-plane components interact
/// with each other and with their callers. They are agnostic of any
/// particular rpc medium.
pub mod transport;

//! The persistent store is an interface to a datastore which suits the
//! project's needs. We may have various implementations, depending on the
//! platform we're running on.

/// Error exposed by the pstor.
pub mod error;
/// Export error module.
pub use error::Error;

/// The store interface.
mod api;
/// Export pstor module.
pub use api::{ObjectKey, StorableObject, Store, StoreKey, StoreKv, StoreObj, StoreValue};

/// A particular implementation of the persistent store, using etcd.
pub mod etcd;
/// An in-process implementation of the persistent store, used for testing
/// and for deployments without an etcd cluster.
pub mod mem;

mod keys;
pub use keys::{generate_key, key_prefix, key_prefix_obj, ApiVersion, StorableObjectType};

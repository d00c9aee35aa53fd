use crate::{generate_key, ApiVersion, Error};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Trait defining the operations that can be performed on a key-value store.
#[async_trait]
pub trait Store: StoreKv + StoreObj + Sync + Send + Clone {
    /// Check if the store is accessible.
    async fn online(&mut self) -> bool;
}

/// Trait defining the operations that can be performed on a key-value store.
/// This is strictly intended for a KV type access.
#[async_trait]
pub trait StoreKv: Sync + Send + Clone {
    /// Puts the given `V` value under the given `K` key.
    async fn put_kv<K: StoreKey, V: StoreValue>(&mut self, key: &K, value: &V)
        -> Result<(), Error>;
    /// Get the value from the given `K` key entry from the store.
    async fn get_kv<K: StoreKey>(&mut self, key: &K) -> Result<Value, Error>;
    /// Deletes the given `K` key entry from the store.
    async fn delete_kv<K: StoreKey>(&mut self, key: &K) -> Result<(), Error>;

    /// Returns a vector of tuples. Each tuple represents a key-value pair.
    async fn get_values_prefix(&mut self, key_prefix: &str) -> Result<Vec<(String, Value)>, Error>;
    /// Returns up to `limit` key-value pairs starting from `key_prefix`.
    /// Intended for iterating over large result sets without loading them
    /// whole; the caller passes the last seen key to fetch the next page.
    async fn get_values_paged(
        &mut self,
        key_prefix: &str,
        limit: i64,
    ) -> Result<Vec<(String, Value)>, Error>;
    /// Deletes all key values from a given prefix.
    async fn delete_values_prefix(&mut self, key_prefix: &str) -> Result<(), Error>;
}

/// Trait defining the operations that can be performed on a key-value store
/// using object semantics. It allows for abstracting the key component into
/// the `StorableObject` itself.
#[async_trait]
pub trait StoreObj: StoreKv + Sync + Send + Clone {
    /// Puts the given `O` object into the store.
    async fn put_obj<O: StorableObject>(&mut self, object: &O) -> Result<(), Error>;
    /// Gets the object `O` through its `O::Key`.
    async fn get_obj<O: StorableObject>(&mut self, key: &O::Key) -> Result<O, Error>;
    /// Deletes the object entry through its `O::Key`.
    async fn delete_obj<K: ObjectKey>(&mut self, key: &K) -> Result<(), Error>;
}

/// Store keys type trait.
pub trait StoreKey: Sync + ToString {}
impl<T> StoreKey for T where T: Sync + ToString {}
/// Store value type trait.
pub trait StoreValue: Sync + serde::Serialize {}
impl<T> StoreValue for T where T: Sync + serde::Serialize {}

/// Implemented by Keys of Storable Objects.
pub trait ObjectKey: Sync + Send {
    /// The type of the key's object kind discriminant.
    type Kind: AsRef<str>;

    /// The full store key for this object.
    fn key(&self) -> String {
        generate_key(self)
    }
    /// The api version of the object schema.
    fn version(&self) -> ApiVersion;
    /// The object kind discriminant.
    fn key_type(&self) -> Self::Kind;
    /// The unique id of the object within its kind.
    fn key_uuid(&self) -> String;
}

/// Implemented by objects which get stored in the store.
#[async_trait]
pub trait StorableObject: Serialize + Sync + Send + DeserializeOwned {
    /// The key type of the object.
    type Key: ObjectKey;

    /// The key of this object.
    fn key(&self) -> Self::Key;
}

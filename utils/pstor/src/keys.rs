use crate::api::ObjectKey;
use strum_macros::{AsRefStr, Display};

/// All types of objects which are storable in our store.
#[derive(Display, AsRefStr, Copy, Clone, Debug)]
pub enum StorableObjectType {
    ReplicationSetSpec,
    ReplicationGroupSpec,
    ReplicationPairSpec,
    VolumeSpec,
    StorageSystemSpec,
    RdfGroupSpec,
}

/// Versions of the storable object schemas.
#[derive(Display, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ApiVersion {
    /// Version 0.
    V0,
}

impl ApiVersion {
    fn number(&self) -> u64 {
        match self {
            Self::V0 => 0,
        }
    }
}

/// Prefix for all keys stored in the persistent store.
pub const ETCD_KEY_PREFIX: &str = "/openrr.io/replication";

/// Returns the key prefix that is used for the keys.
pub fn key_prefix(api_version: ApiVersion) -> String {
    format!("{}/apis/v{}", ETCD_KEY_PREFIX, api_version.number())
}

/// Returns the key prefix that should be used for the keys, in conjunction
/// with a `StorableObjectType` type.
pub fn key_prefix_obj<K: AsRef<str>>(key_type: K, api_version: ApiVersion) -> String {
    format!("{}/{}", key_prefix(api_version), key_type.as_ref())
}

/// Create a key based on the object's key trait.
pub fn generate_key<K: ObjectKey + ?Sized>(k: &K) -> String {
    format!(
        "{}/{}",
        key_prefix_obj(k.key_type(), k.version()),
        k.key_uuid()
    )
}

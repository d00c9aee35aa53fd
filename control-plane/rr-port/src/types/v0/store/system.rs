//! Definition of the storage system types that can be saved to the
//! persistent store.

use crate::types::v0::transport::{RdfGroupId, ReplicationMode, SystemId};
use pstor::{ApiVersion, ObjectKey, StorableObject, StorableObjectType};
use serde::{Deserialize, Serialize};

/// Storage system specification, as discovered.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct StorageSystemSpec {
    /// Identifier of the system.
    pub id: SystemId,
    /// User visible name of the system.
    pub label: String,
    /// Serial number of the array, used to derive native identifiers.
    pub serial_number: String,
    /// Type of the system, e.g. "vmax".
    pub system_type: String,
    /// Whether the system can currently be managed.
    pub reachable: bool,
}

/// Key used by the store to uniquely identify a StorageSystemSpec structure.
pub struct StorageSystemSpecKey(SystemId);

impl From<&SystemId> for StorageSystemSpecKey {
    fn from(id: &SystemId) -> Self {
        Self(id.clone())
    }
}

impl ObjectKey for StorageSystemSpecKey {
    type Kind = StorableObjectType;

    fn version(&self) -> ApiVersion {
        ApiVersion::V0
    }
    fn key_type(&self) -> StorableObjectType {
        StorableObjectType::StorageSystemSpec
    }
    fn key_uuid(&self) -> String {
        self.0.to_string()
    }
}

impl StorableObject for StorageSystemSpec {
    type Key = StorageSystemSpecKey;

    fn key(&self) -> Self::Key {
        StorageSystemSpecKey(self.id.clone())
    }
}

/// Remote director group specification, the array-level construct over
/// which vmax replication pairs are carried.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct RdfGroupSpec {
    /// Identifier of the director group.
    pub id: RdfGroupId,
    /// The system holding the source side of the director group.
    pub source_system: SystemId,
    /// The system holding the target side of the director group.
    pub target_system: SystemId,
    /// Label of the group on the source array.
    pub source_group_label: String,
    /// Label of the group on the target array.
    pub target_group_label: String,
    /// Replication mode the director group is configured for.
    pub replication_mode: Option<ReplicationMode>,
}

/// Key used by the store to uniquely identify a RdfGroupSpec structure.
pub struct RdfGroupSpecKey(RdfGroupId);

impl From<&RdfGroupId> for RdfGroupSpecKey {
    fn from(id: &RdfGroupId) -> Self {
        Self(id.clone())
    }
}

impl ObjectKey for RdfGroupSpecKey {
    type Kind = StorableObjectType;

    fn version(&self) -> ApiVersion {
        ApiVersion::V0
    }
    fn key_type(&self) -> StorableObjectType {
        StorableObjectType::RdfGroupSpec
    }
    fn key_uuid(&self) -> String {
        self.0.to_string()
    }
}

impl StorableObject for RdfGroupSpec {
    type Key = RdfGroupSpecKey;

    fn key(&self) -> Self::Key {
        RdfGroupSpecKey(self.id.clone())
    }
}

//! Definition of the replication group types that can be saved to the
//! persistent store.

use crate::types::v0::{
    store::OpStatusMap,
    transport::{
        CreateReplicationGroup, GroupId, NativeId, ReplicationMode, ReplicationState, SystemId,
    },
};
use pstor::{ApiVersion, ObjectKey, StorableObject, StorableObjectType};
use serde::{Deserialize, Serialize};

/// Replication group specification. A group collects pairs which are
/// operated together on the array. Groups do not carry a reference to their
/// parent set; the set is resolved through the group's system membership.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReplicationGroupSpec {
    /// Identifier of the group.
    pub id: GroupId,
    /// User visible name of the group, unique within its parent set.
    pub display_name: String,
    /// Array-facing identifier, derived from serials and group labels.
    pub native_id: Option<NativeId>,
    /// Type of the storage systems this group spans.
    pub storage_system_type: String,
    /// The system holding the source volumes.
    pub source_system: SystemId,
    /// The system holding the target volumes.
    pub target_system: SystemId,
    /// Name of the group as known on the source array.
    pub source_group_label: String,
    /// Name of the group as known on the target array.
    pub target_group_label: String,
    /// Replication mode of the group's link.
    pub replication_mode: ReplicationMode,
    /// Replication state of the group's link.
    pub replication_state: ReplicationState,
    /// When enforced, member pairs may not be operated individually.
    pub group_consistency_enforced: bool,
    /// Whether the group's arrays can currently be managed.
    pub reachable: bool,
    /// Soft-deletion marker.
    pub inactive: bool,
    /// Record of operations tracked against this group.
    pub op_statuses: OpStatusMap,
}

impl From<&CreateReplicationGroup> for ReplicationGroupSpec {
    fn from(request: &CreateReplicationGroup) -> Self {
        Self {
            id: GroupId::new(),
            display_name: request.display_name.clone(),
            native_id: None,
            storage_system_type: String::new(),
            source_system: request.source_system.clone(),
            target_system: request.target_system.clone(),
            source_group_label: String::new(),
            target_group_label: String::new(),
            replication_mode: request.replication_mode,
            replication_state: request
                .replication_state
                .unwrap_or(ReplicationState::Active),
            group_consistency_enforced: request.group_consistency_enforced,
            reachable: true,
            inactive: false,
            op_statuses: OpStatusMap::new(),
        }
    }
}

/// Key used by the store to uniquely identify a ReplicationGroupSpec
/// structure.
pub struct ReplicationGroupSpecKey(GroupId);

impl From<&GroupId> for ReplicationGroupSpecKey {
    fn from(id: &GroupId) -> Self {
        Self(id.clone())
    }
}

impl ObjectKey for ReplicationGroupSpecKey {
    type Kind = StorableObjectType;

    fn version(&self) -> ApiVersion {
        ApiVersion::V0
    }
    fn key_type(&self) -> StorableObjectType {
        StorableObjectType::ReplicationGroupSpec
    }
    fn key_uuid(&self) -> String {
        self.0.to_string()
    }
}

impl StorableObject for ReplicationGroupSpec {
    type Key = ReplicationGroupSpecKey;

    fn key(&self) -> Self::Key {
        ReplicationGroupSpecKey(self.id.clone())
    }
}

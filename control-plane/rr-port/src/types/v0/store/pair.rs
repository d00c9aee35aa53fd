//! Definition of the replication pair types that can be saved to the
//! persistent store.

use crate::types::v0::{
    store::OpStatusMap,
    transport::{
        GroupId, NativeId, PairId, ReplicationDirection, ReplicationMode, ReplicationState, SetId,
        VolumeId,
    },
};
use pstor::{ApiVersion, ObjectKey, StorableObject, StorableObjectType};
use serde::{Deserialize, Serialize};

/// Replication pair specification, linking one source volume to one target
/// volume within a replication set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReplicationPairSpec {
    /// Identifier of the pair.
    pub id: PairId,
    /// User visible name of the pair.
    pub display_name: String,
    /// Array-facing identifier, derived from the member volume ids.
    pub native_id: Option<NativeId>,
    /// The replication set this pair belongs to.
    pub replication_set: SetId,
    /// The replication group this pair belongs to, if any.
    pub replication_group: Option<GroupId>,
    /// The volume holding the production data.
    pub source_volume: VolumeId,
    /// The volume holding the replica.
    pub target_volume: VolumeId,
    /// Replication mode of the pair's link.
    pub replication_mode: ReplicationMode,
    /// Replication state of the pair's link.
    pub replication_state: ReplicationState,
    /// Direction in which the pair currently replicates.
    pub replication_direction: ReplicationDirection,
    /// Soft-deletion marker.
    pub inactive: bool,
    /// Record of operations tracked against this pair.
    pub op_statuses: OpStatusMap,
}

impl ReplicationPairSpec {
    /// Check whether this pair is a member of a replication group.
    pub fn is_grouped(&self) -> bool {
        self.replication_group.is_some()
    }
}

/// Key used by the store to uniquely identify a ReplicationPairSpec structure.
pub struct ReplicationPairSpecKey(PairId);

impl From<&PairId> for ReplicationPairSpecKey {
    fn from(id: &PairId) -> Self {
        Self(id.clone())
    }
}

impl ObjectKey for ReplicationPairSpecKey {
    type Kind = StorableObjectType;

    fn version(&self) -> ApiVersion {
        ApiVersion::V0
    }
    fn key_type(&self) -> StorableObjectType {
        StorableObjectType::ReplicationPairSpec
    }
    fn key_uuid(&self) -> String {
        self.0.to_string()
    }
}

impl StorableObject for ReplicationPairSpec {
    type Key = ReplicationPairSpecKey;

    fn key(&self) -> Self::Key {
        ReplicationPairSpecKey(self.id.clone())
    }
}

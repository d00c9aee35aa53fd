//! Definition of the volume types that can be saved to the persistent store.

use crate::types::v0::transport::{
    CgId, NativeId, RdfGroupId, ReplicationMode, ReplicationState, SystemId, VolumeId,
    VolumePersonality,
};
use pstor::{ApiVersion, ObjectKey, StorableObject, StorableObjectType};
use serde::{Deserialize, Serialize};

/// Volume specification, as discovered from the arrays. Volumes are the
/// endpoints of replication pairs; their consistency group membership and
/// personality drive the operation validity rules.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct VolumeSpec {
    /// Identifier of the volume.
    pub id: VolumeId,
    /// User visible name of the volume.
    pub label: String,
    /// Array-facing identifier, e.g. the device id.
    pub native_id: NativeId,
    /// The system this volume lives on.
    pub storage_system: SystemId,
    /// The array consistency group this volume belongs to, if any.
    pub consistency_group: Option<CgId>,
    /// Replication personality of the volume, as discovered. After a swap
    /// the nominal source volume carries the `Target` personality.
    pub personality: Option<VolumePersonality>,
    /// The remote director group carrying this volume's srdf mirror, if any.
    pub rdf_group: Option<RdfGroupId>,
    /// The srdf copy mode configured for this volume, if any.
    pub srdf_copy_mode: Option<ReplicationMode>,
    /// Link state of the volume's srdf mirror, if any.
    pub link_state: Option<ReplicationState>,
    /// Soft-deletion marker.
    pub inactive: bool,
}

/// Key used by the store to uniquely identify a VolumeSpec structure.
pub struct VolumeSpecKey(VolumeId);

impl From<&VolumeId> for VolumeSpecKey {
    fn from(id: &VolumeId) -> Self {
        Self(id.clone())
    }
}

impl ObjectKey for VolumeSpecKey {
    type Kind = StorableObjectType;

    fn version(&self) -> ApiVersion {
        ApiVersion::V0
    }
    fn key_type(&self) -> StorableObjectType {
        StorableObjectType::VolumeSpec
    }
    fn key_uuid(&self) -> String {
        self.0.to_string()
    }
}

impl StorableObject for VolumeSpec {
    type Key = VolumeSpecKey;

    fn key(&self) -> Self::Key {
        VolumeSpecKey(self.id.clone())
    }
}

//! Definition of the replication set types that can be saved to the
//! persistent store.

use crate::types::v0::{
    store::OpStatusMap,
    transport::{ElementType, NativeId, ReplicationMode, ReplicationState, SetId, SystemId},
};
use pstor::{ApiVersion, ObjectKey, StorableObject, StorableObjectType};
use serde::{Deserialize, Serialize};

/// Replication set specification, the top-level topology element. A set
/// describes one source/target array relationship and advertises which
/// element granularities, modes and consistency semantics the underlying
/// device technology supports.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ReplicationSetSpec {
    /// Identifier of the set.
    pub id: SetId,
    /// User visible name of the set.
    pub display_name: String,
    /// Array-facing identifier, derived from the member system serials.
    pub native_id: Option<NativeId>,
    /// Type of the storage systems this set spans, e.g. "vmax".
    pub storage_system_type: String,
    /// Systems holding source volumes.
    pub source_systems: Vec<SystemId>,
    /// Systems holding target volumes.
    pub target_systems: Vec<SystemId>,
    /// Element granularities at which link operations may be applied.
    pub supported_element_types: Vec<ElementType>,
    /// Replication modes supported by the device technology.
    pub supported_replication_modes: Vec<ReplicationMode>,
    /// Modes in which member groups must enforce group consistency.
    pub modes_enforcing_group_consistency: Vec<ReplicationMode>,
    /// Modes in which member groups must not enforce group consistency.
    pub modes_forbidding_group_consistency: Vec<ReplicationMode>,
    /// Replication state of the set-wide link, when operated as a whole.
    pub replication_state: ReplicationState,
    /// Whether the set's arrays can currently be managed.
    pub reachable: bool,
    /// Soft-deletion marker, set when an operation left the element in an
    /// indeterminate state or the element was discovered gone.
    pub inactive: bool,
    /// Record of operations tracked against this set.
    pub op_statuses: OpStatusMap,
}

impl ReplicationSetSpec {
    /// Check whether link operations may be applied at the given granularity.
    pub fn supports_element_type(&self, element_type: ElementType) -> bool {
        self.supported_element_types.contains(&element_type)
    }
    /// Check whether the given replication mode is supported.
    pub fn supports_mode(&self, mode: &ReplicationMode) -> bool {
        self.supported_replication_modes.contains(mode)
    }
    /// Check whether groups in the given mode must enforce group consistency.
    pub fn mode_enforces_group_consistency(&self, mode: &ReplicationMode) -> bool {
        self.modes_enforcing_group_consistency.contains(mode)
    }
    /// Check whether groups in the given mode must not enforce group
    /// consistency.
    pub fn mode_forbids_group_consistency(&self, mode: &ReplicationMode) -> bool {
        self.modes_forbidding_group_consistency.contains(mode)
    }
    /// Check whether the given system is a member of this set, in any role.
    pub fn has_system(&self, system: &SystemId) -> bool {
        self.source_systems.contains(system) || self.target_systems.contains(system)
    }
    /// Check whether this set spans the given source and target systems.
    pub fn has_systems(&self, source: &SystemId, target: &SystemId) -> bool {
        self.has_system(source) && self.has_system(target)
    }
}

/// Key used by the store to uniquely identify a ReplicationSetSpec structure.
pub struct ReplicationSetSpecKey(SetId);

impl From<&SetId> for ReplicationSetSpecKey {
    fn from(id: &SetId) -> Self {
        Self(id.clone())
    }
}

impl ObjectKey for ReplicationSetSpecKey {
    type Kind = StorableObjectType;

    fn version(&self) -> ApiVersion {
        ApiVersion::V0
    }
    fn key_type(&self) -> StorableObjectType {
        StorableObjectType::ReplicationSetSpec
    }
    fn key_uuid(&self) -> String {
        self.0.to_string()
    }
}

impl StorableObject for ReplicationSetSpec {
    type Key = ReplicationSetSpecKey;

    fn key(&self) -> Self::Key {
        ReplicationSetSpecKey(self.id.clone())
    }
}

use crate::{
    controller::registry::Registry,
    replication::driver::{DriverError, ReplicationDriver},
};
use async_trait::async_trait;
use pstor::mem::Mem;
use rr_port::types::v0::{
    store::{
        group::ReplicationGroupSpec,
        pair::ReplicationPairSpec,
        set::ReplicationSetSpec,
        system::{RdfGroupSpec, StorageSystemSpec},
        volume::VolumeSpec,
    },
    transport::{
        DriverElement, ElementType, GroupId, NativeId, PairId, RdfGroupId, ReplicationDirection,
        ReplicationMode, ReplicationState, SetId, SystemId, VolumeId, VolumePersonality,
    },
};
use std::time::Duration;

/// A registry over an empty in-memory store.
pub(crate) async fn test_registry() -> Registry<Mem> {
    Registry::with_store(Mem::new(), Duration::from_secs(1))
        .await
        .expect("in-memory store is always online")
}

pub(crate) fn test_system(id: &str, serial: &str) -> StorageSystemSpec {
    StorageSystemSpec {
        id: SystemId::from(id),
        label: id.to_string(),
        serial_number: serial.to_string(),
        system_type: "vmax".to_string(),
        reachable: true,
    }
}

pub(crate) fn test_set(source: &SystemId, target: &SystemId) -> ReplicationSetSpec {
    ReplicationSetSpec {
        id: SetId::new(),
        display_name: "set-1".to_string(),
        native_id: None,
        storage_system_type: "vmax".to_string(),
        source_systems: vec![source.clone()],
        target_systems: vec![target.clone()],
        supported_element_types: vec![
            ElementType::ReplicationPair,
            ElementType::ConsistencyGroup,
            ElementType::ReplicationGroup,
            ElementType::ReplicationSet,
        ],
        supported_replication_modes: vec![
            ReplicationMode::Synchronous,
            ReplicationMode::Asynchronous,
        ],
        modes_enforcing_group_consistency: vec![],
        modes_forbidding_group_consistency: vec![],
        replication_state: ReplicationState::Active,
        reachable: true,
        inactive: false,
        op_statuses: Default::default(),
    }
}

pub(crate) fn test_group(source: &SystemId, target: &SystemId) -> ReplicationGroupSpec {
    ReplicationGroupSpec {
        id: GroupId::new(),
        display_name: "group-1".to_string(),
        native_id: None,
        storage_system_type: "vmax".to_string(),
        source_system: source.clone(),
        target_system: target.clone(),
        source_group_label: "sg-1".to_string(),
        target_group_label: "tg-1".to_string(),
        replication_mode: ReplicationMode::Synchronous,
        replication_state: ReplicationState::Active,
        group_consistency_enforced: false,
        reachable: true,
        inactive: false,
        op_statuses: Default::default(),
    }
}

pub(crate) fn test_volume(system: &SystemId, native: &str) -> VolumeSpec {
    VolumeSpec {
        id: VolumeId::new(),
        label: native.to_string(),
        native_id: NativeId::from(native),
        storage_system: system.clone(),
        consistency_group: None,
        personality: Some(VolumePersonality::Source),
        rdf_group: None,
        srdf_copy_mode: Some(ReplicationMode::Synchronous),
        link_state: Some(ReplicationState::Active),
        inactive: false,
    }
}

pub(crate) fn test_pair(
    set: &SetId,
    source: &VolumeId,
    target: &VolumeId,
) -> ReplicationPairSpec {
    ReplicationPairSpec {
        id: PairId::new(),
        display_name: "pair-1".to_string(),
        native_id: None,
        replication_set: set.clone(),
        replication_group: None,
        source_volume: source.clone(),
        target_volume: target.clone(),
        replication_mode: ReplicationMode::Synchronous,
        replication_state: ReplicationState::Active,
        replication_direction: ReplicationDirection::SourceToTarget,
        inactive: false,
        op_statuses: Default::default(),
    }
}

pub(crate) fn test_rdf_group(source: &SystemId, target: &SystemId) -> RdfGroupSpec {
    RdfGroupSpec {
        id: RdfGroupId::from("rdf-1"),
        source_system: source.clone(),
        target_system: target.clone(),
        source_group_label: "10".to_string(),
        target_group_label: "20".to_string(),
        replication_mode: Some(ReplicationMode::Synchronous),
    }
}

/// A device driver which records the calls it receives and can be told to
/// reject everything.
#[derive(Default)]
pub(crate) struct FakeDriver {
    fail_with: parking_lot::Mutex<Option<String>>,
    calls: parking_lot::Mutex<Vec<String>>,
}

impl FakeDriver {
    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            fail_with: parking_lot::Mutex::new(Some(reason.to_string())),
            calls: Default::default(),
        }
    }
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
    fn complete(&self, call: String) -> Result<(), DriverError> {
        self.calls.lock().push(call);
        match self.fail_with.lock().clone() {
            Some(reason) => Err(DriverError::Rejected { reason }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReplicationDriver for FakeDriver {
    async fn create_group(&self, group: &ReplicationGroupSpec) -> Result<(), DriverError> {
        self.complete(format!("create_group {}", group.display_name))
    }
    async fn failover_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("failover_link {}", element.address))
    }
    async fn failback_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("failback_link {}", element.address))
    }
    async fn establish_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("establish_link {}", element.address))
    }
    async fn split_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("split_link {}", element.address))
    }
    async fn suspend_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("suspend_link {}", element.address))
    }
    async fn resume_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("resume_link {}", element.address))
    }
    async fn swap_link(&self, element: &DriverElement) -> Result<(), DriverError> {
        self.complete(format!("swap_link {}", element.address))
    }
    async fn change_mode(
        &self,
        element: &DriverElement,
        mode: ReplicationMode,
    ) -> Result<(), DriverError> {
        self.complete(format!("change_mode {} {}", element.address, mode))
    }
}

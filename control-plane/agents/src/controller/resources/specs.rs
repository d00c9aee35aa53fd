use super::{resource_map::ResourceMap, ResourceMutex};
use crate::errors::SvcError;
use pstor::{key_prefix_obj, ApiVersion, StorableObjectType, StoreKv};
use rr_port::types::v0::{
    store::{
        group::ReplicationGroupSpec,
        pair::ReplicationPairSpec,
        set::ReplicationSetSpec,
        system::{RdfGroupSpec, StorageSystemSpec},
        volume::VolumeSpec,
    },
    transport::{GroupId, PairId, RdfGroupId, SetId, SystemId, VolumeId},
};
use serde::de::DeserializeOwned;
use std::{ops::Deref, sync::Arc};

/// Locked resource specs.
#[derive(Default, Clone, Debug)]
pub struct ResourceSpecsLocked(Arc<parking_lot::RwLock<ResourceSpecs>>);

impl Deref for ResourceSpecsLocked {
    type Target = Arc<parking_lot::RwLock<ResourceSpecs>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Resource spec map of the replication topology.
#[derive(Default, Debug)]
pub struct ResourceSpecs {
    pub sets: ResourceMap<SetId, ReplicationSetSpec>,
    pub groups: ResourceMap<GroupId, ReplicationGroupSpec>,
    pub pairs: ResourceMap<PairId, ReplicationPairSpec>,
    pub volumes: ResourceMap<VolumeId, VolumeSpec>,
    pub systems: ResourceMap<SystemId, StorageSystemSpec>,
    pub rdf_groups: ResourceMap<RdfGroupId, RdfGroupSpec>,
}

impl ResourceSpecsLocked {
    pub fn new() -> Self {
        ResourceSpecsLocked::default()
    }

    /// Initialise the resource specs with the content of the persistent
    /// store.
    pub async fn init<S: StoreKv>(&self, store: &mut S) -> Result<(), SvcError> {
        let sets: Vec<ReplicationSetSpec> =
            get_store_items(store, StorableObjectType::ReplicationSetSpec).await?;
        let groups: Vec<ReplicationGroupSpec> =
            get_store_items(store, StorableObjectType::ReplicationGroupSpec).await?;
        let pairs: Vec<ReplicationPairSpec> =
            get_store_items(store, StorableObjectType::ReplicationPairSpec).await?;
        let volumes: Vec<VolumeSpec> =
            get_store_items(store, StorableObjectType::VolumeSpec).await?;
        let systems: Vec<StorageSystemSpec> =
            get_store_items(store, StorableObjectType::StorageSystemSpec).await?;
        let rdf_groups: Vec<RdfGroupSpec> =
            get_store_items(store, StorableObjectType::RdfGroupSpec).await?;

        let mut specs = self.write();
        specs.sets.populate(sets);
        specs.groups.populate(groups);
        specs.pairs.populate(pairs);
        specs.volumes.populate(volumes);
        specs.systems.populate(systems);
        specs.rdf_groups.populate(rdf_groups);
        Ok(())
    }

    /// Get a copy of the replication set spec with the given id.
    pub fn set(&self, id: &SetId) -> Option<ReplicationSetSpec> {
        self.read().sets.get(id).map(|s| s.lock().clone())
    }
    /// Get the protected replication set spec with the given id.
    pub fn set_rsc(&self, id: &SetId) -> Option<ResourceMutex<ReplicationSetSpec>> {
        self.read().sets.get(id).cloned()
    }
    /// Get a copy of all the replication set specs.
    pub fn sets(&self) -> Vec<ReplicationSetSpec> {
        self.read().sets.values().map(|s| s.lock().clone()).collect()
    }

    /// Get a copy of the replication group spec with the given id.
    pub fn group(&self, id: &GroupId) -> Option<ReplicationGroupSpec> {
        self.read().groups.get(id).map(|g| g.lock().clone())
    }
    /// Get the protected replication group spec with the given id.
    pub fn group_rsc(&self, id: &GroupId) -> Option<ResourceMutex<ReplicationGroupSpec>> {
        self.read().groups.get(id).cloned()
    }
    /// Get a copy of all the replication group specs.
    pub fn groups(&self) -> Vec<ReplicationGroupSpec> {
        self.read()
            .groups
            .values()
            .map(|g| g.lock().clone())
            .collect()
    }

    /// Get a copy of the replication pair spec with the given id.
    pub fn pair(&self, id: &PairId) -> Option<ReplicationPairSpec> {
        self.read().pairs.get(id).map(|p| p.lock().clone())
    }
    /// Get the protected replication pair spec with the given id.
    pub fn pair_rsc(&self, id: &PairId) -> Option<ResourceMutex<ReplicationPairSpec>> {
        self.read().pairs.get(id).cloned()
    }
    /// Get a copy of all the replication pair specs.
    pub fn pairs(&self) -> Vec<ReplicationPairSpec> {
        self.read()
            .pairs
            .values()
            .map(|p| p.lock().clone())
            .collect()
    }

    /// Get a copy of the volume spec with the given id.
    pub fn volume(&self, id: &VolumeId) -> Option<VolumeSpec> {
        self.read().volumes.get(id).map(|v| v.lock().clone())
    }

    /// Get a copy of the storage system spec with the given id.
    pub fn system(&self, id: &SystemId) -> Option<StorageSystemSpec> {
        self.read().systems.get(id).map(|s| s.lock().clone())
    }

    /// Get a copy of all the remote director group specs.
    pub fn rdf_groups(&self) -> Vec<RdfGroupSpec> {
        self.read()
            .rdf_groups
            .values()
            .map(|g| g.lock().clone())
            .collect()
    }
}

/// Fetch and deserialise all objects of the given type from the store.
async fn get_store_items<T: DeserializeOwned, S: StoreKv>(
    store: &mut S,
    obj_type: StorableObjectType,
) -> Result<Vec<T>, SvcError> {
    let prefix = key_prefix_obj(obj_type, ApiVersion::V0);
    let values = store.get_values_prefix(&prefix).await?;
    values
        .into_iter()
        .map(|(_, value)| {
            serde_json::from_value(value.clone()).map_err(|source| {
                SvcError::Store {
                    source: pstor::Error::DeserialiseValue {
                        value: value.to_string(),
                        source,
                    },
                }
            })
        })
        .collect()
}

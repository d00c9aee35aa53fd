//! Topology queries over the replication resource specs. Groups do not
//! reference their parent set directly; the set is resolved through the
//! group's storage system membership, mirroring what is discovered on the
//! arrays.

use crate::{controller::resources::specs::ResourceSpecsLocked, errors::SvcError};
use rr_port::types::v0::{
    store::{group::ReplicationGroupSpec, pair::ReplicationPairSpec, set::ReplicationSetSpec},
    transport::{CgId, GroupId, SetId, SystemId, VolumeId},
};

impl ResourceSpecsLocked {
    /// Get all replication sets spanning systems of the given type.
    pub fn sets_of_system_type(&self, system_type: &str) -> Vec<ReplicationSetSpec> {
        self.sets()
            .into_iter()
            .filter(|set| set.storage_system_type == system_type)
            .collect()
    }

    /// Get the replication set spanning the given source and target systems.
    pub fn set_for_systems(
        &self,
        system_type: &str,
        source: &SystemId,
        target: &SystemId,
    ) -> Option<ReplicationSetSpec> {
        self.sets_of_system_type(system_type)
            .into_iter()
            .find(|set| set.has_systems(source, target))
    }

    /// Resolve the replication set which the given group belongs to. The
    /// set must have the same storage system type as the group and span
    /// both of the group's systems.
    pub fn set_for_group(
        &self,
        group: &ReplicationGroupSpec,
    ) -> Result<ReplicationSetSpec, SvcError> {
        match self.set_for_systems(
            &group.storage_system_type,
            &group.source_system,
            &group.target_system,
        ) {
            Some(set) => Ok(set),
            None => {
                // there must be a set for every discovered group
                tracing::error!(
                    group.id = %group.id,
                    group.system_type = %group.storage_system_type,
                    "No replication set found for replication group"
                );
                Err(SvcError::NoSetForGroup {
                    group_id: group.id.clone(),
                    system_type: group.storage_system_type.clone(),
                })
            }
        }
    }

    /// Get all groups which resolve to the given replication set.
    pub fn groups_of_set(&self, set: &ReplicationSetSpec) -> Vec<ReplicationGroupSpec> {
        self.groups()
            .into_iter()
            .filter(|group| {
                group.storage_system_type == set.storage_system_type
                    && set.has_systems(&group.source_system, &group.target_system)
            })
            .collect()
    }

    /// Get all pairs of the given replication set, including pairs held by
    /// the set's groups.
    pub fn pairs_in_set(&self, set_id: &SetId) -> Vec<ReplicationPairSpec> {
        self.pairs()
            .into_iter()
            .filter(|pair| &pair.replication_set == set_id)
            .collect()
    }

    /// Get the pairs held directly by the given replication set, excluding
    /// pairs which are members of a group.
    pub fn direct_pairs_in_set(&self, set_id: &SetId) -> Vec<ReplicationPairSpec> {
        self.pairs_in_set(set_id)
            .into_iter()
            .filter(|pair| !pair.is_grouped())
            .collect()
    }

    /// Get all pairs held by the given replication group.
    pub fn pairs_in_group(&self, group_id: &GroupId) -> Vec<ReplicationPairSpec> {
        self.pairs()
            .into_iter()
            .filter(|pair| pair.replication_group.as_ref() == Some(group_id))
            .collect()
    }

    /// Get all pairs whose source volume is the given volume.
    pub fn pairs_for_source_volume(&self, volume_id: &VolumeId) -> Vec<ReplicationPairSpec> {
        self.pairs()
            .into_iter()
            .filter(|pair| &pair.source_volume == volume_id)
            .collect()
    }

    /// Get all pairs with the given volume on either end.
    pub fn pairs_for_volume(&self, volume_id: &VolumeId) -> Vec<ReplicationPairSpec> {
        self.pairs()
            .into_iter()
            .filter(|pair| {
                &pair.source_volume == volume_id || &pair.target_volume == volume_id
            })
            .collect()
    }

    /// Get all volumes which are members of the given consistency group.
    pub fn volumes_in_cg(&self, cg_id: &CgId) -> Vec<VolumeId> {
        self.read()
            .volumes
            .values()
            .filter(|volume| volume.lock().consistency_group.as_ref() == Some(cg_id))
            .map(|volume| volume.immutable_ref().id.clone())
            .collect()
    }

    /// Get all pairs with a member volume in the given consistency group,
    /// on either end.
    pub fn pairs_for_cg(&self, cg_id: &CgId) -> Vec<ReplicationPairSpec> {
        let volumes = self.volumes_in_cg(cg_id);
        self.pairs()
            .into_iter()
            .filter(|pair| {
                volumes.contains(&pair.source_volume) || volumes.contains(&pair.target_volume)
            })
            .collect()
    }

    /// Check whether both member volumes of the given pair sit in array
    /// consistency groups.
    pub fn pair_in_cg(&self, pair: &ReplicationPairSpec) -> Result<bool, SvcError> {
        let source = self
            .volume(&pair.source_volume)
            .ok_or(SvcError::VolumeNotFound {
                volume_id: pair.source_volume.clone(),
            })?;
        let target = self
            .volume(&pair.target_volume)
            .ok_or(SvcError::VolumeNotFound {
                volume_id: pair.target_volume.clone(),
            })?;
        Ok(source.consistency_group.is_some() && target.consistency_group.is_some())
    }
}

//! Reconciles replication pairs from srdf volume mirrors. Srdf swap
//! operations exchange the source and target volumes, while replication
//! pair roles are immutable; a swap instead flips the pair's replication
//! direction. The adapter resolves the nominal roles from the volume
//! personalities before touching any pair.

use crate::{controller::registry::Registry, errors::SvcError};
use pstor::{etcd::Etcd, StorableObject, Store};
use rr_port::types::v0::{
    store::{
        pair::ReplicationPairSpec,
        system::{RdfGroupSpec, StorageSystemSpec},
        volume::VolumeSpec,
    },
    transport::{
        NativeId, PairId, ReplicationDirection, ReplicationMode, VolumeId, VolumePersonality,
    },
};

/// Derive the array-facing identifier of a replication set from its member
/// systems. The serials are sorted so both sides derive the same identifier.
pub fn set_native_id(systems: &[StorageSystemSpec]) -> Option<NativeId> {
    if systems.is_empty() {
        return None;
    }
    let mut serials = systems
        .iter()
        .map(|system| system.serial_number.as_str())
        .collect::<Vec<_>>();
    serials.sort_unstable();
    Some(NativeId::from(serials.join("+")))
}

/// Derive the array-facing identifier of a replication group from the
/// member systems and the remote director group carrying it.
pub fn group_native_id(
    source: &StorageSystemSpec,
    target: &StorageSystemSpec,
    rdf_group: &RdfGroupSpec,
) -> NativeId {
    NativeId::from(format!(
        "{}+{}+{}+{}",
        source.serial_number,
        rdf_group.source_group_label,
        target.serial_number,
        rdf_group.target_group_label
    ))
}

/// Derive the array-facing identifier of a replication pair from its
/// member volumes.
pub fn pair_native_id(source: &VolumeSpec, target: &VolumeSpec) -> NativeId {
    NativeId::from(format!("{}+{}", source.native_id, target.native_id))
}

/// Resolve the nominal pair roles for the given srdf volumes. When the
/// mirror is swapped the nominal source is the srdf target volume.
pub fn resolve_roles(source: &VolumeId, target: &VolumeId, swapped: bool) -> (VolumeId, VolumeId) {
    if swapped {
        (target.clone(), source.clone())
    } else {
        (source.clone(), target.clone())
    }
}

/// Adapter reconciling replication pairs from srdf volume mirrors.
pub struct SrdfAdapter<S: Store = Etcd> {
    registry: Registry<S>,
}

impl<S: Store> SrdfAdapter<S> {
    /// Create a new adapter over the given registry.
    pub fn new(registry: Registry<S>) -> Self {
        Self { registry }
    }

    /// The registry of the adapter.
    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Check whether the srdf mirror is swapped, based on the personality
    /// discovered on the srdf source volume.
    pub fn is_swapped(&self, source: &VolumeId) -> Result<bool, SvcError> {
        let volume = self
            .registry
            .specs()
            .volume(source)
            .ok_or(SvcError::VolumeNotFound {
                volume_id: source.clone(),
            })?;
        Ok(volume.personality == Some(VolumePersonality::Target))
    }

    /// Create the replication pair for the given srdf volume mirror.
    pub async fn create_pair(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<ReplicationPairSpec, SvcError> {
        self.create_pair_inner(source, target)
            .await
            .map_err(|error| reconcile_error(source, target, error))
    }

    /// Update the replication pair for the given srdf volume mirror,
    /// refreshing its native identifier, mode, state and direction.
    pub async fn update_pair(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<ReplicationPairSpec, SvcError> {
        self.update_pair_inner(source, target)
            .await
            .map_err(|error| reconcile_error(source, target, error))
    }

    /// Update the replication pair for the given srdf volume mirror,
    /// creating it if it does not exist yet. Reapplying the same mirror is
    /// idempotent.
    pub async fn update_or_create_pair(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<ReplicationPairSpec, SvcError> {
        let swapped = self
            .is_swapped(source)
            .map_err(|error| reconcile_error(source, target, error))?;
        let (source_id, target_id) = resolve_roles(source, target, swapped);
        let result = match self.find_pair(&source_id, &target_id) {
            Some(_) => self.update_pair_inner(source, target).await,
            None => self.create_pair_inner(source, target).await,
        };
        result.map_err(|error| reconcile_error(source, target, error))
    }

    /// Delete the replication pair for the given srdf volume mirror. The
    /// deletion is idempotent: a missing pair is logged and ignored.
    pub async fn delete_pair(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<(), SvcError> {
        self.delete_pair_inner(source, target)
            .await
            .map_err(|error| reconcile_error(source, target, error))
    }

    /// Delete the replication pairs of every volume in the same
    /// consistency group as the srdf source volume. When the source volume
    /// is not in a consistency group only its own pair is deleted.
    pub async fn delete_pairs_for_cg(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<(), SvcError> {
        let specs = self.registry.specs();
        let volume = specs.volume(source).ok_or(SvcError::VolumeNotFound {
            volume_id: source.clone(),
        })?;
        match &volume.consistency_group {
            None => {
                tracing::warn!(volume.id = %source, "Srdf source volume is not in a consistency group");
                self.delete_pair(source, target).await
            }
            Some(cg_id) => {
                for member in specs.volumes_in_cg(cg_id) {
                    let Some(pair) = specs.pairs_for_source_volume(&member).into_iter().next()
                    else {
                        tracing::debug!(volume.id = %member, "No replication pair for consistency group member");
                        continue;
                    };
                    self.delete_pair(&member, &pair.target_volume).await?;
                }
                Ok(())
            }
        }
    }

    async fn create_pair_inner(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<ReplicationPairSpec, SvcError> {
        let swapped = self.is_swapped(source)?;
        let (source_id, target_id) = resolve_roles(source, target, swapped);
        let pair = self.build_pair(&source_id, &target_id, swapped)?;
        self.registry.store_obj(&pair).await?;
        self.registry.specs().write().pairs.insert(pair.clone());
        tracing::info!(
            pair.id = %pair.id,
            source.id = %source_id,
            target.id = %target_id,
            swapped,
            "Created replication pair for srdf mirror"
        );
        Ok(pair)
    }

    async fn update_pair_inner(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<ReplicationPairSpec, SvcError> {
        let swapped = self.is_swapped(source)?;
        let (source_id, target_id) = resolve_roles(source, target, swapped);
        let existing =
            self.find_pair(&source_id, &target_id)
                .ok_or_else(|| SvcError::Internal {
                    details: format!(
                        "No replication pair for volumes '{source_id}' -> '{target_id}'"
                    ),
                })?;
        let mut pair = self.build_pair(&source_id, &target_id, swapped)?;
        pair.id = existing.id;
        pair.display_name = existing.display_name;
        pair.op_statuses = existing.op_statuses;
        self.registry.store_obj(&pair).await?;
        self.registry.specs().write().pairs.insert(pair.clone());
        tracing::info!(
            pair.id = %pair.id,
            source.id = %source_id,
            target.id = %target_id,
            swapped,
            "Updated replication pair for srdf mirror"
        );
        Ok(pair)
    }

    async fn delete_pair_inner(
        &self,
        source: &VolumeId,
        target: &VolumeId,
    ) -> Result<(), SvcError> {
        let swapped = self.is_swapped(source)?;
        let (source_id, target_id) = resolve_roles(source, target, swapped);
        let Some(pair) = self.find_pair(&source_id, &target_id) else {
            tracing::warn!(
                source.id = %source_id,
                target.id = %target_id,
                "No replication pair to delete for srdf mirror"
            );
            return Ok(());
        };
        self.registry.delete_obj(&pair.key()).await?;
        self.registry.specs().write().pairs.remove(&pair.id);
        tracing::info!(
            pair.id = %pair.id,
            source.id = %source_id,
            target.id = %target_id,
            "Deleted replication pair for srdf mirror"
        );
        Ok(())
    }

    /// Find the pair linking the given nominal source and target volumes.
    fn find_pair(&self, source: &VolumeId, target: &VolumeId) -> Option<ReplicationPairSpec> {
        self.registry
            .specs()
            .pairs()
            .into_iter()
            .find(|pair| &pair.source_volume == source && &pair.target_volume == target)
    }

    /// Build the pair spec for the given nominal source and target
    /// volumes. The rdf group and copy mode come from the swapped side of
    /// the mirror, as that is the side the array reports them on.
    fn build_pair(
        &self,
        source_id: &VolumeId,
        target_id: &VolumeId,
        swapped: bool,
    ) -> Result<ReplicationPairSpec, SvcError> {
        let specs = self.registry.specs();
        let source = specs.volume(source_id).ok_or(SvcError::VolumeNotFound {
            volume_id: source_id.clone(),
        })?;
        let target = specs.volume(target_id).ok_or(SvcError::VolumeNotFound {
            volume_id: target_id.clone(),
        })?;
        let source_system =
            specs
                .system(&source.storage_system)
                .ok_or(SvcError::SystemNotFound {
                    system_id: source.storage_system.clone(),
                })?;
        let target_system =
            specs
                .system(&target.storage_system)
                .ok_or(SvcError::SystemNotFound {
                    system_id: target.storage_system.clone(),
                })?;

        let (rdf_side, direction) = if swapped {
            (&source, ReplicationDirection::TargetToSource)
        } else {
            (&target, ReplicationDirection::SourceToTarget)
        };
        let rdf_group = rdf_side.rdf_group.as_ref().and_then(|rdf_id| {
            specs
                .rdf_groups()
                .into_iter()
                .find(|group| &group.id == rdf_id)
        });
        if rdf_group.is_none() {
            tracing::info!(
                source.id = %source_id,
                target.id = %target_id,
                "No remote director group defined for srdf mirror"
            );
        }

        let set = specs
            .set_for_systems(
                &source_system.system_type,
                &source_system.id,
                &target_system.id,
            )
            .ok_or_else(|| SvcError::Internal {
                details: format!(
                    "No replication set spans systems '{}' and '{}'",
                    source_system.id, target_system.id
                ),
            })?;

        let group_native = rdf_group
            .as_ref()
            .map(|rdf| group_native_id(&source_system, &target_system, rdf));
        let replication_group = group_native.as_ref().and_then(|native_id| {
            specs
                .groups()
                .into_iter()
                .find(|group| group.native_id.as_ref() == Some(native_id))
                .map(|group| group.id)
        });

        let mode = rdf_side
            .srdf_copy_mode
            .or(rdf_group.as_ref().and_then(|rdf| rdf.replication_mode))
            .unwrap_or(ReplicationMode::Synchronous);

        Ok(ReplicationPairSpec {
            id: PairId::new(),
            display_name: format!("{}/{}", source.label, target.label),
            native_id: Some(pair_native_id(&source, &target)),
            replication_set: set.id,
            replication_group,
            source_volume: source_id.clone(),
            target_volume: target_id.clone(),
            replication_mode: mode,
            replication_state: source.link_state.unwrap_or_default(),
            replication_direction: direction,
            inactive: false,
            op_statuses: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests;

/// Wrap a reconcile failure with the srdf volume mirror it was for.
fn reconcile_error(source: &VolumeId, target: &VolumeId, error: SvcError) -> SvcError {
    SvcError::SrdfReconcile {
        source_volume: source.clone(),
        target_volume: target.clone(),
        source: Box::new(error),
    }
}

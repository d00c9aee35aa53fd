use crate::{
    controller::registry::Registry,
    errors::SvcError,
    srdf::{group_native_id, pair_native_id, resolve_roles, set_native_id, SrdfAdapter},
    test_utils::{test_rdf_group, test_registry, test_set, test_system, test_volume},
};
use pstor::mem::Mem;
use rr_port::types::v0::{
    store::volume::VolumeSpec,
    transport::{
        CgId, NativeId, ReplicationDirection, SystemId, VolumeId, VolumePersonality,
    },
};

#[test]
fn set_native_id_is_order_independent() {
    let a = test_system("sys-a", "000194900");
    let b = test_system("sys-b", "000195700");
    let forwards = set_native_id(&[a.clone(), b.clone()]);
    let backwards = set_native_id(&[b, a]);
    assert_eq!(forwards, backwards);
    assert_eq!(forwards, Some(NativeId::from("000194900+000195700")));
    assert_eq!(set_native_id(&[]), None);
}

#[test]
fn group_and_pair_native_id_derivation() {
    let a = test_system("sys-a", "000194900");
    let b = test_system("sys-b", "000195700");
    let rdf = test_rdf_group(&a.id, &b.id);
    assert_eq!(
        group_native_id(&a, &b, &rdf),
        NativeId::from("000194900+10+000195700+20")
    );

    let source = test_volume(&a.id, "0012A");
    let target = test_volume(&b.id, "0034B");
    assert_eq!(pair_native_id(&source, &target), NativeId::from("0012A+0034B"));
}

#[test]
fn resolve_roles_honours_the_swap() {
    let source = VolumeId::new();
    let target = VolumeId::new();
    assert_eq!(
        resolve_roles(&source, &target, false),
        (source.clone(), target.clone())
    );
    assert_eq!(resolve_roles(&source, &target, true), (target, source));
}

struct SrdfFixture {
    adapter: SrdfAdapter<Mem>,
    source: VolumeSpec,
    target: VolumeSpec,
}

impl SrdfFixture {
    fn specs(&self) -> &crate::controller::resources::specs::ResourceSpecsLocked {
        self.adapter_registry().specs()
    }
    fn adapter_registry(&self) -> &Registry<Mem> {
        self.adapter.registry()
    }
}

/// Two vmax systems spanned by one set, one rdf group and one srdf volume
/// mirror.
async fn srdf_fixture() -> SrdfFixture {
    let registry = test_registry().await;
    let system_a = test_system("sys-a", "000194900");
    let system_b = test_system("sys-b", "000195700");
    let set = test_set(&system_a.id, &system_b.id);
    let rdf = test_rdf_group(&system_a.id, &system_b.id);
    let mut source = test_volume(&system_a.id, "0012A");
    let mut target = test_volume(&system_b.id, "0034B");
    target.personality = Some(VolumePersonality::Target);
    target.rdf_group = Some(rdf.id.clone());
    source.rdf_group = Some(rdf.id.clone());
    {
        let specs = registry.specs();
        let mut specs = specs.write();
        specs.systems.insert(system_a);
        specs.systems.insert(system_b);
        specs.sets.insert(set);
        specs.rdf_groups.insert(rdf);
        specs.volumes.insert(source.clone());
        specs.volumes.insert(target.clone());
    }
    SrdfFixture {
        adapter: SrdfAdapter::new(registry),
        source,
        target,
    }
}

#[tokio::test]
async fn create_pair_derives_native_ids_and_membership() {
    let fix = srdf_fixture().await;
    // a discovered group carried by the rdf group of the mirror
    let mut group = crate::test_utils::test_group(
        &fix.source.storage_system,
        &fix.target.storage_system,
    );
    group.native_id = Some(NativeId::from("000194900+10+000195700+20"));
    fix.specs().write().groups.insert(group.clone());

    let pair = fix
        .adapter
        .create_pair(&fix.source.id, &fix.target.id)
        .await
        .expect("the mirror is complete");

    assert_eq!(pair.source_volume, fix.source.id);
    assert_eq!(pair.target_volume, fix.target.id);
    assert_eq!(pair.replication_direction, ReplicationDirection::SourceToTarget);
    assert_eq!(pair.native_id, Some(NativeId::from("0012A+0034B")));
    assert_eq!(pair.replication_group, Some(group.id));
    assert!(fix.specs().pair(&pair.id).is_some());
}

#[tokio::test]
async fn swapped_mirrors_keep_nominal_roles_and_flip_direction() {
    let fix = srdf_fixture().await;
    // after an srdf swap the nominal source carries the target personality
    {
        let specs = fix.specs().read();
        specs
            .volumes
            .get(&fix.source.id)
            .unwrap()
            .lock()
            .personality = Some(VolumePersonality::Target);
        specs
            .volumes
            .get(&fix.target.id)
            .unwrap()
            .lock()
            .personality = Some(VolumePersonality::Source);
    }

    let pair = fix
        .adapter
        .create_pair(&fix.source.id, &fix.target.id)
        .await
        .expect("the mirror is complete");

    assert_eq!(pair.source_volume, fix.target.id);
    assert_eq!(pair.target_volume, fix.source.id);
    assert_eq!(pair.replication_direction, ReplicationDirection::TargetToSource);
    assert_eq!(pair.native_id, Some(NativeId::from("0034B+0012A")));
}

#[tokio::test]
async fn update_or_create_is_idempotent() {
    let fix = srdf_fixture().await;
    let first = fix
        .adapter
        .update_or_create_pair(&fix.source.id, &fix.target.id)
        .await
        .expect("the pair is created");
    let second = fix
        .adapter
        .update_or_create_pair(&fix.source.id, &fix.target.id)
        .await
        .expect("the pair is updated in place");

    assert_eq!(first.id, second.id);
    assert_eq!(fix.specs().pairs().len(), 1);
}

#[tokio::test]
async fn pair_identity_is_stable_across_swaps() {
    let fix = srdf_fixture().await;
    let before = fix
        .adapter
        .update_or_create_pair(&fix.source.id, &fix.target.id)
        .await
        .expect("the pair is created");
    assert_eq!(before.replication_direction, ReplicationDirection::SourceToTarget);

    // an array swap exchanges the srdf roles, while the personalities keep
    // recording the nominal ones
    let after = fix
        .adapter
        .update_or_create_pair(&fix.target.id, &fix.source.id)
        .await
        .expect("the swapped mirror maps onto the same pair");

    assert_eq!(after.id, before.id);
    assert_eq!(after.native_id, before.native_id);
    assert_eq!(after.source_volume, fix.source.id);
    assert_eq!(after.target_volume, fix.target.id);
    assert_eq!(after.replication_direction, ReplicationDirection::TargetToSource);
    assert_eq!(fix.specs().pairs().len(), 1);
}

#[tokio::test]
async fn update_requires_an_existing_pair() {
    let fix = srdf_fixture().await;
    let error = fix
        .adapter
        .update_pair(&fix.source.id, &fix.target.id)
        .await
        .expect_err("nothing to update yet");
    assert!(matches!(error, SvcError::SrdfReconcile { .. }));
}

#[tokio::test]
async fn missing_pairs_are_ignored_on_delete() {
    let fix = srdf_fixture().await;
    fix.adapter
        .delete_pair(&fix.source.id, &fix.target.id)
        .await
        .expect("deleting a missing pair is not an error");
}

#[tokio::test]
async fn consistency_group_deletion_cascades_to_all_members() {
    let fix = srdf_fixture().await;
    let specs = fix.specs();
    let cg = CgId::new();
    // second mirror in the same consistency group
    let system_a = SystemId::from("sys-a");
    let system_b = SystemId::from("sys-b");
    let mut source_2 = test_volume(&system_a, "0056C");
    let mut target_2 = test_volume(&system_b, "0078D");
    source_2.consistency_group = Some(cg.clone());
    target_2.consistency_group = Some(cg.clone());
    {
        let mut locked = specs.write();
        locked.volumes.insert(source_2.clone());
        locked.volumes.insert(target_2.clone());
    }
    specs
        .read()
        .volumes
        .get(&fix.source.id)
        .unwrap()
        .lock()
        .consistency_group = Some(cg.clone());
    specs
        .read()
        .volumes
        .get(&fix.target.id)
        .unwrap()
        .lock()
        .consistency_group = Some(cg);

    fix.adapter
        .create_pair(&fix.source.id, &fix.target.id)
        .await
        .unwrap();
    fix.adapter
        .create_pair(&source_2.id, &target_2.id)
        .await
        .unwrap();
    assert_eq!(specs.pairs().len(), 2);

    fix.adapter
        .delete_pairs_for_cg(&fix.source.id, &fix.target.id)
        .await
        .expect("the cascade deletes every member pair");
    assert!(specs.pairs().is_empty());
}

#[tokio::test]
async fn deletion_without_a_consistency_group_only_touches_the_mirror() {
    let fix = srdf_fixture().await;
    fix.adapter
        .create_pair(&fix.source.id, &fix.target.id)
        .await
        .unwrap();

    fix.adapter
        .delete_pairs_for_cg(&fix.source.id, &fix.target.id)
        .await
        .expect("falls back to a single pair deletion");
    assert!(fix.specs().pairs().is_empty());
}

use crate::{
    errors::SvcError,
    replication::service::Service,
    test_utils::{test_group, test_pair, test_set, test_system, test_volume, FakeDriver},
};
use pstor::mem::Mem;
use rr_port::types::v0::transport::{
    CgId, CreateReplicationGroup, ElementType, OperationState, OperationType, ReplicationElement,
    ReplicationMode, ReplicationState,
};
use std::{sync::Arc, time::Duration};

struct Fixture {
    service: Service<Mem>,
    driver: Arc<FakeDriver>,
    store: Mem,
}

/// One set spanning two systems, two volumes and one ungrouped pair.
async fn fixture(driver: FakeDriver) -> (Fixture, rr_port::types::v0::store::pair::ReplicationPairSpec) {
    let store = Mem::new();
    let registry = crate::controller::registry::Registry::with_store(store.clone(), Duration::from_secs(1))
        .await
        .expect("in-memory store is always online");
    let source_system = test_system("sys-a", "000194900");
    let target_system = test_system("sys-b", "000195700");
    let set = test_set(&source_system.id, &target_system.id);
    let source = test_volume(&source_system.id, "0012A");
    let target = test_volume(&target_system.id, "0034B");
    let pair = test_pair(&set.id, &source.id, &target.id);
    {
        let specs = registry.specs();
        let mut specs = specs.write();
        specs.systems.insert(source_system);
        specs.systems.insert(target_system);
        specs.sets.insert(set);
        specs.volumes.insert(source);
        specs.volumes.insert(target);
        specs.pairs.insert(pair.clone());
    }
    let driver = Arc::new(driver);
    let service = Service::new(registry, driver.clone());
    (
        Fixture {
            service,
            driver,
            store,
        },
        pair,
    )
}

#[tokio::test]
async fn failover_on_ungrouped_pair_is_dispatched() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let element = ReplicationElement::Pair(pair.id.clone());

    let task = fix.service.failover_link(&element).await.expect("operation is legal");

    assert_eq!(task.element, element);
    assert_eq!(task.status.operation, OperationType::FailoverLink);
    assert_eq!(task.status.state, OperationState::InProgress);
    assert_eq!(fix.driver.calls(), vec![format!("failover_link {}", pair.id)]);

    // the in-progress task was recorded on the pair before the dispatch
    let pair = fix.service.registry().specs().pair(&pair.id).unwrap();
    let status = pair.op_statuses.get(&task.task).unwrap();
    assert_eq!(status.state, OperationState::InProgress);
}

#[tokio::test]
async fn operations_on_enforced_group_members_are_denied() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let set = specs.sets().remove(0);
    let mut group = test_group(&set.source_systems[0], &set.target_systems[0]);
    group.group_consistency_enforced = true;
    {
        let mut locked = specs.write();
        locked.groups.insert(group.clone());
        let member = locked.pairs.get(&pair.id).unwrap().clone();
        member.lock().replication_group = Some(group.id.clone());
    }

    let error = fix
        .service
        .suspend_link(&ReplicationElement::Pair(pair.id.clone()))
        .await
        .expect_err("group consistency is enforced");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));
    assert!(fix.driver.calls().is_empty());

    // the group itself may still be operated
    fix.service
        .suspend_link(&ReplicationElement::Group(group.id.clone()))
        .await
        .expect("group operations are legal");
    assert_eq!(fix.driver.calls(), vec![format!("suspend_link {}", group.id)]);
}

#[tokio::test]
async fn operations_on_non_enforced_group_members_are_allowed() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let set = specs.sets().remove(0);
    // the group leaves consistency unenforced, so members stay operable
    let group = test_group(&set.source_systems[0], &set.target_systems[0]);
    {
        let mut locked = specs.write();
        locked.groups.insert(group.clone());
        let member = locked.pairs.get(&pair.id).unwrap().clone();
        member.lock().replication_group = Some(group.id.clone());
    }

    let task = fix
        .service
        .suspend_link(&ReplicationElement::Pair(pair.id.clone()))
        .await
        .expect("the group does not enforce consistency");
    assert_eq!(task.status.operation, OperationType::SuspendLink);
    assert_eq!(task.status.state, OperationState::InProgress);
    assert_eq!(fix.driver.calls(), vec![format!("suspend_link {}", pair.id)]);
}

#[tokio::test]
async fn driver_failure_marks_task_errored_and_element_inactive() {
    let (fix, pair) = fixture(FakeDriver::failing("link is offline")).await;
    let element = ReplicationElement::Pair(pair.id.clone());

    let error = fix
        .service
        .establish_link(&element)
        .await
        .expect_err("the driver rejects everything");
    assert!(matches!(error, SvcError::DriverDispatch { .. }));

    let pair = fix.service.registry().specs().pair(&pair.id).unwrap();
    assert!(pair.inactive);
    let status = pair.op_statuses.values().next().unwrap();
    assert!(status.errored());

    // the errored state survives a registry restart over the same store
    let registry =
        crate::controller::registry::Registry::with_store(fix.store.clone(), Duration::from_secs(1))
            .await
            .unwrap();
    let reloaded = registry.specs().pair(&pair.id).unwrap();
    assert!(reloaded.inactive);
    assert!(reloaded.op_statuses.values().next().unwrap().errored());
}

#[tokio::test]
async fn driver_failure_on_set_failover_marks_the_set_inactive() {
    let (fix, pair) = fixture(FakeDriver::failing("link is offline")).await;
    let element = ReplicationElement::Set(pair.replication_set.clone());

    let error = fix
        .service
        .failover_link(&element)
        .await
        .expect_err("the driver rejects everything");
    assert!(matches!(error, SvcError::DriverDispatch { .. }));

    let set = fix.service.registry().specs().set(&pair.replication_set).unwrap();
    assert!(set.inactive);
    assert!(set.op_statuses.values().next().unwrap().errored());
}

#[tokio::test]
async fn pairs_with_volumes_in_consistency_groups_are_denied_individually() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let cg = CgId::new();
    {
        let locked = specs.read();
        locked
            .volumes
            .get(&pair.source_volume)
            .unwrap()
            .lock()
            .consistency_group = Some(cg.clone());
        locked
            .volumes
            .get(&pair.target_volume)
            .unwrap()
            .lock()
            .consistency_group = Some(cg.clone());
    }

    let error = fix
        .service
        .split_link(&ReplicationElement::Pair(pair.id.clone()))
        .await
        .expect_err("pairs in consistency groups may not be operated individually");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));

    // operating the consistency group as a whole is legal
    let task = fix
        .service
        .split_link(&ReplicationElement::ConsistencyGroup(cg.clone()))
        .await
        .expect("consistency group operations are legal");
    assert_eq!(task.status.operation, OperationType::SplitLink);
    assert_eq!(fix.driver.calls(), vec![format!("split_link {cg}")]);

    // and the task was recorded on every member pair
    let pair = specs.pair(&pair.id).unwrap();
    assert!(pair.op_statuses.contains_key(&task.task));
}

#[tokio::test]
async fn consistency_group_operations_require_wholly_contained_pairs() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let cg = CgId::new();
    // only the source volume joins the consistency group
    specs
        .read()
        .volumes
        .get(&pair.source_volume)
        .unwrap()
        .lock()
        .consistency_group = Some(cg.clone());

    let error = fix
        .service
        .suspend_link(&ReplicationElement::ConsistencyGroup(cg))
        .await
        .expect_err("a member pair reaches outside of the consistency group");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));
    assert!(fix.driver.calls().is_empty());
}

#[tokio::test]
async fn set_operations_follow_the_supported_granularities() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let set_id = pair.replication_set.clone();

    fix.service
        .resume_link(&ReplicationElement::Set(set_id.clone()))
        .await
        .expect("set operations are supported");

    specs
        .read()
        .sets
        .get(&set_id)
        .unwrap()
        .lock()
        .supported_element_types = vec![ElementType::ReplicationPair];

    let error = fix
        .service
        .resume_link(&ReplicationElement::Set(set_id))
        .await
        .expect_err("set operations are no longer supported");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));
}

#[tokio::test]
async fn mode_changes_are_denied_on_grouped_pairs_and_unknown_modes() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let element = ReplicationElement::Pair(pair.id.clone());

    // AdaptiveCopy is not among the set's supported modes
    let error = fix
        .service
        .change_mode(&element, ReplicationMode::AdaptiveCopy)
        .await
        .expect_err("the mode is not supported by the set");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));

    let task = fix
        .service
        .change_mode(&element, ReplicationMode::Asynchronous)
        .await
        .expect("the mode is supported");
    assert_eq!(task.status.operation, OperationType::ChangeMode);

    // group membership rules out individual mode changes
    let set = specs.set(&pair.replication_set).unwrap();
    let group = test_group(&set.source_systems[0], &set.target_systems[0]);
    specs.read().pairs.get(&pair.id).unwrap().lock().replication_group = Some(group.id.clone());
    specs.write().groups.insert(group);
    let error = fix
        .service
        .change_mode(&element, ReplicationMode::Asynchronous)
        .await
        .expect_err("grouped pairs may not change mode individually");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));
}

#[tokio::test]
async fn mode_changes_require_a_reachable_set() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    specs
        .read()
        .sets
        .get(&pair.replication_set)
        .unwrap()
        .lock()
        .reachable = false;

    let error = fix
        .service
        .change_mode(
            &ReplicationElement::Set(pair.replication_set.clone()),
            ReplicationMode::Asynchronous,
        )
        .await
        .expect_err("the set is unreachable");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));
}

#[tokio::test]
async fn create_group_validates_and_persists() {
    let (fix, _pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let set = specs.sets().remove(0);

    let request = CreateReplicationGroup {
        replication_set: set.id.clone(),
        display_name: "payroll".to_string(),
        source_system: set.source_systems[0].clone(),
        target_system: set.target_systems[0].clone(),
        replication_mode: ReplicationMode::Synchronous,
        replication_state: None,
        group_consistency_enforced: false,
    };
    let group = fix.service.create_group(&request).await.expect("request is valid");
    assert_eq!(group.replication_state, ReplicationState::Active);
    assert!(group.reachable);
    assert_eq!(group.storage_system_type, set.storage_system_type);
    assert_eq!(
        group
            .op_statuses
            .values()
            .map(|status| status.operation)
            .collect::<Vec<_>>(),
        vec![OperationType::CreateGroup]
    );
    assert_eq!(fix.driver.calls(), vec!["create_group payroll".to_string()]);

    // the group survives a registry restart over the same store
    let registry =
        crate::controller::registry::Registry::with_store(fix.store.clone(), Duration::from_secs(1))
            .await
            .unwrap();
    assert!(registry.specs().group(&group.id).is_some());

    // display names are unique within the set, case insensitively
    let duplicate = CreateReplicationGroup {
        display_name: "PayRoll".to_string(),
        ..request.clone()
    };
    let error = fix
        .service
        .create_group(&duplicate)
        .await
        .expect_err("the name is already taken");
    assert!(matches!(error, SvcError::DuplicateGroupLabel { .. }));
    assert_eq!(specs.groups().len(), 1);
}

#[tokio::test]
async fn create_group_rejects_unsupported_modes_and_consistency_flags() {
    let (fix, _pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let set = specs.sets().remove(0);
    {
        let locked = specs.read();
        let set = locked.sets.get(&set.id).unwrap();
        let mut set = set.lock();
        set.modes_enforcing_group_consistency = vec![ReplicationMode::Synchronous];
        set.modes_forbidding_group_consistency = vec![ReplicationMode::Asynchronous];
    }

    let request = CreateReplicationGroup {
        replication_set: set.id.clone(),
        display_name: "billing".to_string(),
        source_system: set.source_systems[0].clone(),
        target_system: set.target_systems[0].clone(),
        replication_mode: ReplicationMode::AdaptiveCopy,
        replication_state: None,
        group_consistency_enforced: false,
    };
    let error = fix
        .service
        .create_group(&request)
        .await
        .expect_err("the mode is not supported");
    assert!(matches!(error, SvcError::InvalidReplicationMode { .. }));

    // synchronous groups in this set must enforce consistency
    let error = fix
        .service
        .create_group(&CreateReplicationGroup {
            replication_mode: ReplicationMode::Synchronous,
            group_consistency_enforced: false,
            ..request.clone()
        })
        .await
        .expect_err("consistency must be enforced");
    assert!(matches!(
        error,
        SvcError::InvalidGroupConsistencyFlag {
            enforced: false,
            ..
        }
    ));

    // and asynchronous groups must not
    let error = fix
        .service
        .create_group(&CreateReplicationGroup {
            replication_mode: ReplicationMode::Asynchronous,
            group_consistency_enforced: true,
            ..request
        })
        .await
        .expect_err("consistency must not be enforced");
    assert!(matches!(
        error,
        SvcError::InvalidGroupConsistencyFlag { enforced: true, .. }
    ));
    assert!(fix.driver.calls().is_empty());
}

#[tokio::test]
async fn groups_without_a_resolvable_set_are_denied() {
    let (fix, _pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    // systems of a type no set spans
    let foreign = test_system("sys-z", "000199999");
    let mut group = test_group(&foreign.id, &foreign.id);
    group.storage_system_type = "unity".to_string();
    {
        let mut locked = specs.write();
        locked.systems.insert(foreign);
        locked.groups.insert(group.clone());
    }

    let error = fix
        .service
        .failover_link(&ReplicationElement::Group(group.id))
        .await
        .expect_err("no set spans the group's systems");
    assert!(matches!(error, SvcError::OperationNotAllowed { .. }));
}

#[tokio::test]
async fn topology_distinguishes_direct_and_grouped_pairs() {
    let (fix, pair) = fixture(FakeDriver::default()).await;
    let specs = fix.service.registry().specs();
    let set = specs.sets().remove(0);
    let group = test_group(&set.source_systems[0], &set.target_systems[0]);
    let grouped_source = test_volume(&set.source_systems[0], "0056C");
    let grouped_target = test_volume(&set.target_systems[0], "0078D");
    let mut grouped = test_pair(&set.id, &grouped_source.id, &grouped_target.id);
    grouped.replication_group = Some(group.id.clone());
    {
        let mut locked = specs.write();
        locked.groups.insert(group.clone());
        locked.volumes.insert(grouped_source);
        locked.volumes.insert(grouped_target);
        locked.pairs.insert(grouped.clone());
    }

    assert_eq!(specs.pairs_in_set(&set.id).len(), 2);
    let direct = specs.direct_pairs_in_set(&set.id);
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].id, pair.id);
    let in_group = specs.pairs_in_group(&group.id);
    assert_eq!(in_group.len(), 1);
    assert_eq!(in_group[0].id, grouped.id);

    // volume-scoped listings see a pair from either end
    let by_target = specs.pairs_for_volume(&grouped.target_volume);
    assert_eq!(by_target.len(), 1);
    assert_eq!(by_target[0].id, grouped.id);
    assert_eq!(specs.pairs_for_volume(&pair.source_volume).len(), 1);
    assert!(specs.pairs_for_source_volume(&grouped.target_volume).is_empty());

    // the group resolves back to its set through system membership
    let resolved = specs.set_for_group(&group).expect("the set spans the group");
    assert_eq!(resolved.id, set.id);
    assert_eq!(specs.groups_of_set(&set).len(), 1);
    // grouped pairs live in the set their group resolves to
    assert_eq!(grouped.replication_set, resolved.id);

    // a second set of the same system type but spanning other systems does
    // not capture the group
    let other_source = test_system("sys-c", "000196800");
    let other_target = test_system("sys-d", "000197900");
    let mut other_set = test_set(&other_source.id, &other_target.id);
    other_set.display_name = "set-2".to_string();
    {
        let mut locked = specs.write();
        locked.systems.insert(other_source);
        locked.systems.insert(other_target);
        locked.sets.insert(other_set.clone());
    }
    assert_eq!(specs.sets_of_system_type("vmax").len(), 2);
    let resolved = specs.set_for_group(&group).expect("membership disambiguates the set");
    assert_eq!(resolved.id, set.id);
    assert!(specs.groups_of_set(&other_set).is_empty());
}

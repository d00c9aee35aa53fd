//! Link operation orchestration. Every operation follows the same
//! sequence: validate against the discovered configuration, record an
//! in-progress task on the element, persist it, then dispatch to the
//! device driver. A driver failure marks the task errored and the element
//! inactive before the error is propagated, so an operator can tell which
//! elements were left in an indeterminate state on the arrays.

use crate::{
    controller::registry::Registry,
    errors::SvcError,
    replication::{
        driver::ReplicationDriver,
        validator::{OperationValidator, OperationValidity},
    },
};
use pstor::{etcd::Etcd, Store};
use rr_port::types::v0::{
    store::group::ReplicationGroupSpec,
    transport::{
        CreateReplicationGroup, DriverElement, ElementType, LinkOperation, OperationStatus,
        OperationType, ReplicationElement, ReplicationMode, ReplicationTask, TaskId,
    },
};
use std::sync::Arc;

/// The replication service, orchestrating link operations over the
/// topology held by the registry.
#[derive(Clone)]
pub struct Service<S: Store = Etcd> {
    registry: Registry<S>,
    driver: Arc<dyn ReplicationDriver>,
}

impl<S: Store> Service<S> {
    /// Create a new replication service over the given registry and device
    /// driver.
    pub fn new(registry: Registry<S>, driver: Arc<dyn ReplicationDriver>) -> Self {
        Self { registry, driver }
    }

    /// The registry of the service.
    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Create a replication group under an existing replication set.
    pub async fn create_group(
        &self,
        request: &CreateReplicationGroup,
    ) -> Result<ReplicationGroupSpec, SvcError> {
        let specs = self.registry.specs();
        let set = specs
            .set(&request.replication_set)
            .ok_or(SvcError::SetNotFound {
                set_id: request.replication_set.clone(),
            })?;

        let duplicate = specs
            .groups_of_set(&set)
            .iter()
            .any(|group| group.display_name.eq_ignore_ascii_case(&request.display_name));
        if duplicate {
            return Err(SvcError::DuplicateGroupLabel {
                label: request.display_name.clone(),
                set_id: set.id,
            });
        }
        if !set.supports_mode(&request.replication_mode) {
            return Err(SvcError::InvalidReplicationMode {
                mode: request.replication_mode,
                set_id: set.id,
            });
        }
        if set.mode_enforces_group_consistency(&request.replication_mode)
            && !request.group_consistency_enforced
        {
            return Err(SvcError::InvalidGroupConsistencyFlag {
                mode: request.replication_mode,
                set_id: set.id,
                enforced: false,
            });
        }
        if set.mode_forbids_group_consistency(&request.replication_mode)
            && request.group_consistency_enforced
        {
            return Err(SvcError::InvalidGroupConsistencyFlag {
                mode: request.replication_mode,
                set_id: set.id,
                enforced: true,
            });
        }

        let mut group = ReplicationGroupSpec::from(request);
        group.storage_system_type = set.storage_system_type.clone();
        let task = TaskId::new();
        group.op_statuses.insert(
            task.clone(),
            OperationStatus::in_progress(OperationType::CreateGroup),
        );
        self.registry.store_obj(&group).await?;
        specs.write().groups.insert(group.clone());

        if let Err(error) = self.driver.create_group(&group).await {
            let element = ReplicationElement::Group(group.id.clone());
            self.fail_task(&element, &task, &error.to_string()).await;
            return Err(SvcError::DriverDispatch {
                operation: OperationType::CreateGroup,
                element_type: ElementType::ReplicationGroup,
                element_id: group.id.to_string(),
                source: error,
            });
        }

        tracing::info!(
            group.id = %group.id,
            group.label = %group.display_name,
            set.id = %set.id,
            "Created replication group"
        );
        Ok(group)
    }

    /// Fail the element's link over to the target side.
    pub async fn failover_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Failover).await
    }
    /// Fail the element's link back to the source side.
    pub async fn failback_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Failback).await
    }
    /// (Re)establish replication over the element's link.
    pub async fn establish_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Establish).await
    }
    /// Split the element's link.
    pub async fn split_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Split).await
    }
    /// Suspend replication over the element's link.
    pub async fn suspend_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Suspend).await
    }
    /// Resume replication over the element's suspended link.
    pub async fn resume_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Resume).await
    }
    /// Exchange source and target personalities over the element's link.
    pub async fn swap_link(
        &self,
        element: &ReplicationElement,
    ) -> Result<ReplicationTask, SvcError> {
        self.link_operation(element, LinkOperation::Swap).await
    }

    /// Apply a link operation to the given element.
    pub async fn link_operation(
        &self,
        element: &ReplicationElement,
        operation: LinkOperation,
    ) -> Result<ReplicationTask, SvcError> {
        let op_type = OperationType::from(operation);
        let validity =
            OperationValidator::new(self.registry.specs()).validate_link_operation(element)?;
        if let OperationValidity::Denied(reason) = validity {
            return Err(SvcError::OperationNotAllowed {
                operation: op_type,
                element_type: element.element_type(),
                element_id: element.id_str(),
                reason: reason.to_string(),
            });
        }

        let task = TaskId::new();
        let status = OperationStatus::in_progress(op_type);
        self.begin_task(element, &task, &status).await?;
        let target = self.driver_element(element)?;

        tracing::info!(
            %element,
            operation = %op_type,
            task.id = %task,
            "Dispatching link operation to the device driver"
        );
        let result = match operation {
            LinkOperation::Failover => self.driver.failover_link(&target).await,
            LinkOperation::Failback => self.driver.failback_link(&target).await,
            LinkOperation::Establish => self.driver.establish_link(&target).await,
            LinkOperation::Split => self.driver.split_link(&target).await,
            LinkOperation::Suspend => self.driver.suspend_link(&target).await,
            LinkOperation::Resume => self.driver.resume_link(&target).await,
            LinkOperation::Swap => self.driver.swap_link(&target).await,
        };

        match result {
            Ok(()) => Ok(ReplicationTask {
                element: element.clone(),
                task,
                status,
            }),
            Err(error) => {
                self.fail_task(element, &task, &error.to_string()).await;
                Err(SvcError::DriverDispatch {
                    operation: op_type,
                    element_type: element.element_type(),
                    element_id: element.id_str(),
                    source: error,
                })
            }
        }
    }

    /// Change the replication mode of the given element.
    pub async fn change_mode(
        &self,
        element: &ReplicationElement,
        new_mode: ReplicationMode,
    ) -> Result<ReplicationTask, SvcError> {
        let validity = OperationValidator::new(self.registry.specs())
            .validate_mode_change(element, new_mode)?;
        if let OperationValidity::Denied(reason) = validity {
            return Err(SvcError::OperationNotAllowed {
                operation: OperationType::ChangeMode,
                element_type: element.element_type(),
                element_id: element.id_str(),
                reason: reason.to_string(),
            });
        }

        let task = TaskId::new();
        let status = OperationStatus::in_progress(OperationType::ChangeMode);
        self.begin_task(element, &task, &status).await?;
        let target = self.driver_element(element)?;

        tracing::info!(
            %element,
            mode = %new_mode,
            task.id = %task,
            "Dispatching mode change to the device driver"
        );
        if let Err(error) = self.driver.change_mode(&target, new_mode).await {
            self.fail_task(element, &task, &error.to_string()).await;
            return Err(SvcError::DriverDispatch {
                operation: OperationType::ChangeMode,
                element_type: element.element_type(),
                element_id: element.id_str(),
                source: error,
            });
        }
        Ok(ReplicationTask {
            element: element.clone(),
            task,
            status,
        })
    }

    /// Record an in-progress task on the element and persist it, before
    /// anything is dispatched to the driver.
    async fn begin_task(
        &self,
        element: &ReplicationElement,
        task: &TaskId,
        status: &OperationStatus,
    ) -> Result<(), SvcError> {
        self.update_elements(element, |statuses, _inactive| {
            statuses.insert(task.clone(), status.clone());
        })
        .await
    }

    /// Mark the task errored and the element inactive, keeping the store
    /// in sync. A failure to persist at this point is logged rather than
    /// propagated, so the driver error itself is what reaches the caller.
    async fn fail_task(&self, element: &ReplicationElement, task: &TaskId, cause: &str) {
        let result = self
            .update_elements(element, |statuses, inactive| {
                if let Some(status) = statuses.get_mut(task) {
                    status.error(cause.to_string());
                }
                *inactive = true;
            })
            .await;
        if let Err(error) = result {
            tracing::error!(
                %element,
                task.id = %task,
                %error,
                "Failed to persist the errored operation status"
            );
        }
    }

    /// Apply a mutation to the specs backing the element and persist them.
    /// A consistency group element maps onto all of its member pairs.
    async fn update_elements<F>(
        &self,
        element: &ReplicationElement,
        mutate: F,
    ) -> Result<(), SvcError>
    where
        F: Fn(&mut rr_port::types::v0::store::OpStatusMap, &mut bool),
    {
        let specs = self.registry.specs();
        match element {
            ReplicationElement::Pair(pair_id) => {
                let pair = specs.pair_rsc(pair_id).ok_or(SvcError::PairNotFound {
                    pair_id: pair_id.clone(),
                })?;
                let updated = {
                    let mut pair = pair.lock();
                    let spec = &mut *pair;
                    mutate(&mut spec.op_statuses, &mut spec.inactive);
                    pair.clone()
                };
                self.registry.store_obj(&updated).await
            }
            ReplicationElement::ConsistencyGroup(cg_id) => {
                for member in specs.pairs_for_cg(cg_id) {
                    let pair = specs.pair_rsc(&member.id).ok_or(SvcError::PairNotFound {
                        pair_id: member.id.clone(),
                    })?;
                    let updated = {
                        let mut pair = pair.lock();
                        let spec = &mut *pair;
                        mutate(&mut spec.op_statuses, &mut spec.inactive);
                        pair.clone()
                    };
                    self.registry.store_obj(&updated).await?;
                }
                Ok(())
            }
            ReplicationElement::Group(group_id) => {
                let group = specs.group_rsc(group_id).ok_or(SvcError::GroupNotFound {
                    group_id: group_id.clone(),
                })?;
                let updated = {
                    let mut group = group.lock();
                    let spec = &mut *group;
                    mutate(&mut spec.op_statuses, &mut spec.inactive);
                    group.clone()
                };
                self.registry.store_obj(&updated).await
            }
            ReplicationElement::Set(set_id) => {
                let set = specs.set_rsc(set_id).ok_or(SvcError::SetNotFound {
                    set_id: set_id.clone(),
                })?;
                let updated = {
                    let mut set = set.lock();
                    let spec = &mut *set;
                    mutate(&mut spec.op_statuses, &mut spec.inactive);
                    set.clone()
                };
                self.registry.store_obj(&updated).await
            }
        }
    }

    /// Resolve the array-facing address of the element for the driver.
    /// Elements fall back to their control-plane identifier until a native
    /// identifier has been discovered.
    fn driver_element(&self, element: &ReplicationElement) -> Result<DriverElement, SvcError> {
        let specs = self.registry.specs();
        let address = match element {
            ReplicationElement::Pair(pair_id) => {
                let pair = specs.pair(pair_id).ok_or(SvcError::PairNotFound {
                    pair_id: pair_id.clone(),
                })?;
                pair.native_id
                    .map(String::from)
                    .unwrap_or_else(|| pair_id.to_string())
            }
            ReplicationElement::ConsistencyGroup(cg_id) => cg_id.to_string(),
            ReplicationElement::Group(group_id) => {
                let group = specs.group(group_id).ok_or(SvcError::GroupNotFound {
                    group_id: group_id.clone(),
                })?;
                group
                    .native_id
                    .map(String::from)
                    .unwrap_or_else(|| group_id.to_string())
            }
            ReplicationElement::Set(set_id) => {
                let set = specs.set(set_id).ok_or(SvcError::SetNotFound {
                    set_id: set_id.clone(),
                })?;
                set.native_id
                    .map(String::from)
                    .unwrap_or_else(|| set_id.to_string())
            }
        };
        Ok(DriverElement {
            element_type: element.element_type(),
            address,
        })
    }
}

//! Operation validity rules, derived from the replication configuration
//! discovered on the arrays. An operation is never dispatched to the
//! device driver unless the rules allow it on the requested element.

use crate::{controller::resources::specs::ResourceSpecsLocked, errors::SvcError};
use rr_port::types::v0::{
    store::{pair::ReplicationPairSpec, set::ReplicationSetSpec},
    transport::{
        CgId, ElementType, GroupId, PairId, ReplicationElement, ReplicationMode, SetId,
    },
};

/// Verdict of an operation validity check.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationValidity {
    /// The operation may be dispatched.
    Allowed,
    /// The operation must be rejected, with the rule which denied it.
    Denied(DeniedReason),
}

impl OperationValidity {
    /// Check whether the operation may be dispatched.
    pub fn allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// The rule which denied an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeniedReason {
    /// The parent set does not allow operations at pair granularity.
    PairOperationsUnsupported { set_id: SetId },
    /// The parent set does not allow operations at group granularity.
    GroupOperationsUnsupported { set_id: SetId },
    /// The set does not allow operations at set granularity.
    SetOperationsUnsupported { set_id: SetId },
    /// Individual pair operations are not allowed when the pair's volumes
    /// sit in array consistency groups.
    PairInConsistencyGroup { pair_id: PairId },
    /// Consistency group operations require every member pair to have both
    /// volumes in a consistency group.
    PairOutsideConsistencyGroup { pair_id: PairId },
    /// The pair's group enforces group consistency, so operations on a
    /// subset of its pairs are not allowed.
    GroupConsistencyEnforced { group_id: GroupId },
    /// No replication set could be resolved for the group.
    NoSetForGroup { group_id: GroupId },
    /// The element's set or group is not currently reachable.
    Unreachable { element_type: ElementType, id: String },
    /// The set does not support the requested replication mode.
    ModeUnsupported {
        set_id: SetId,
        mode: ReplicationMode,
    },
    /// Mode changes are not allowed on pairs which are group members.
    GroupedPairModeChange { pair_id: PairId },
}

impl std::fmt::Display for DeniedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PairOperationsUnsupported { set_id } => {
                write!(
                    f,
                    "replication set '{set_id}' does not support pair operations"
                )
            }
            Self::GroupOperationsUnsupported { set_id } => {
                write!(
                    f,
                    "replication set '{set_id}' does not support group operations"
                )
            }
            Self::SetOperationsUnsupported { set_id } => {
                write!(
                    f,
                    "replication set '{set_id}' does not support set operations"
                )
            }
            Self::PairInConsistencyGroup { pair_id } => {
                write!(
                    f,
                    "pair '{pair_id}' has volumes in a consistency group and may not be operated individually"
                )
            }
            Self::PairOutsideConsistencyGroup { pair_id } => {
                write!(
                    f,
                    "pair '{pair_id}' has volumes outside of the consistency group"
                )
            }
            Self::GroupConsistencyEnforced { group_id } => {
                write!(
                    f,
                    "replication group '{group_id}' enforces group consistency"
                )
            }
            Self::NoSetForGroup { group_id } => {
                write!(
                    f,
                    "no replication set could be resolved for replication group '{group_id}'"
                )
            }
            Self::Unreachable { element_type, id } => {
                write!(f, "{element_type} '{id}' is not reachable")
            }
            Self::ModeUnsupported { set_id, mode } => {
                write!(
                    f,
                    "replication set '{set_id}' does not support replication mode '{mode}'"
                )
            }
            Self::GroupedPairModeChange { pair_id } => {
                write!(
                    f,
                    "pair '{pair_id}' is a group member and may not change mode individually"
                )
            }
        }
    }
}

/// Validates operations against the discovered replication configuration.
pub struct OperationValidator<'a> {
    specs: &'a ResourceSpecsLocked,
}

impl<'a> OperationValidator<'a> {
    /// Create a validator over the given resource specs.
    pub fn new(specs: &'a ResourceSpecsLocked) -> Self {
        Self { specs }
    }

    /// Check whether a link operation may be applied to the given element.
    pub fn validate_link_operation(
        &self,
        element: &ReplicationElement,
    ) -> Result<OperationValidity, SvcError> {
        match element {
            ReplicationElement::Pair(pair_id) => {
                let pair = self.pair(pair_id)?;
                self.link_operation_on_pair(&pair)
            }
            ReplicationElement::ConsistencyGroup(cg_id) => self.link_operation_on_cg(cg_id),
            ReplicationElement::Group(group_id) => {
                let group =
                    self.specs
                        .group(group_id)
                        .ok_or(SvcError::GroupNotFound {
                            group_id: group_id.clone(),
                        })?;
                match self.specs.set_for_group(&group) {
                    Ok(set) if set.supports_element_type(ElementType::ReplicationGroup) => {
                        Ok(OperationValidity::Allowed)
                    }
                    Ok(set) => Ok(OperationValidity::Denied(
                        DeniedReason::GroupOperationsUnsupported { set_id: set.id },
                    )),
                    Err(SvcError::NoSetForGroup { .. }) => Ok(OperationValidity::Denied(
                        DeniedReason::NoSetForGroup {
                            group_id: group.id.clone(),
                        },
                    )),
                    Err(error) => Err(error),
                }
            }
            ReplicationElement::Set(set_id) => {
                let set = self.set(set_id)?;
                if set.supports_element_type(ElementType::ReplicationSet) {
                    Ok(OperationValidity::Allowed)
                } else {
                    Ok(OperationValidity::Denied(
                        DeniedReason::SetOperationsUnsupported { set_id: set.id },
                    ))
                }
            }
        }
    }

    /// Check whether the replication mode of the given element may be
    /// changed to `new_mode`.
    pub fn validate_mode_change(
        &self,
        element: &ReplicationElement,
        new_mode: ReplicationMode,
    ) -> Result<OperationValidity, SvcError> {
        match element {
            ReplicationElement::Pair(pair_id) => {
                let pair = self.pair(pair_id)?;
                self.mode_change_on_pair(&pair, new_mode)
            }
            ReplicationElement::ConsistencyGroup(cg_id) => {
                for pair in self.specs.pairs_for_cg(cg_id) {
                    let validity = self.mode_change_on_pair(&pair, new_mode)?;
                    if !validity.allowed() {
                        return Ok(validity);
                    }
                }
                Ok(OperationValidity::Allowed)
            }
            ReplicationElement::Group(group_id) => {
                let group =
                    self.specs
                        .group(group_id)
                        .ok_or(SvcError::GroupNotFound {
                            group_id: group_id.clone(),
                        })?;
                if !group.reachable {
                    return Ok(OperationValidity::Denied(DeniedReason::Unreachable {
                        element_type: ElementType::ReplicationGroup,
                        id: group.id.to_string(),
                    }));
                }
                let set = self.specs.set_for_group(&group)?;
                if !set.supports_element_type(ElementType::ReplicationGroup) {
                    Ok(OperationValidity::Denied(
                        DeniedReason::GroupOperationsUnsupported { set_id: set.id },
                    ))
                } else if !set.supports_mode(&new_mode) {
                    Ok(OperationValidity::Denied(DeniedReason::ModeUnsupported {
                        set_id: set.id,
                        mode: new_mode,
                    }))
                } else {
                    Ok(OperationValidity::Allowed)
                }
            }
            ReplicationElement::Set(set_id) => {
                let set = self.set(set_id)?;
                if !set.reachable {
                    Ok(OperationValidity::Denied(DeniedReason::Unreachable {
                        element_type: ElementType::ReplicationSet,
                        id: set.id.to_string(),
                    }))
                } else if !set.supports_element_type(ElementType::ReplicationSet) {
                    Ok(OperationValidity::Denied(
                        DeniedReason::SetOperationsUnsupported { set_id: set.id },
                    ))
                } else if !set.supports_mode(&new_mode) {
                    Ok(OperationValidity::Denied(DeniedReason::ModeUnsupported {
                        set_id: set.id,
                        mode: new_mode,
                    }))
                } else {
                    Ok(OperationValidity::Allowed)
                }
            }
        }
    }

    /// A pair may be operated individually when its set allows pair
    /// granularity, its volumes sit outside of consistency groups and its
    /// group, if any, does not enforce group consistency.
    fn link_operation_on_pair(
        &self,
        pair: &ReplicationPairSpec,
    ) -> Result<OperationValidity, SvcError> {
        let set = self.set(&pair.replication_set)?;
        if !set.supports_element_type(ElementType::ReplicationPair) {
            return Ok(OperationValidity::Denied(
                DeniedReason::PairOperationsUnsupported { set_id: set.id },
            ));
        }
        if self.specs.pair_in_cg(pair)? {
            tracing::info!(pair.id = %pair.id, "Pair has source/target volumes in a consistency group");
            return Ok(OperationValidity::Denied(
                DeniedReason::PairInConsistencyGroup {
                    pair_id: pair.id.clone(),
                },
            ));
        }
        self.group_consistency_check(pair)
    }

    /// Consistency group operations act on every member pair, so each of
    /// them must be wholly inside the consistency group and individually
    /// operable.
    fn link_operation_on_cg(&self, cg_id: &CgId) -> Result<OperationValidity, SvcError> {
        for pair in self.specs.pairs_for_cg(cg_id) {
            if !self.specs.pair_in_cg(&pair)? {
                tracing::info!(pair.id = %pair.id, "Pair has source/target volumes outside of the consistency group");
                return Ok(OperationValidity::Denied(
                    DeniedReason::PairOutsideConsistencyGroup { pair_id: pair.id },
                ));
            }
            let set = self.set(&pair.replication_set)?;
            if !set.supports_element_type(ElementType::ReplicationPair) {
                return Ok(OperationValidity::Denied(
                    DeniedReason::PairOperationsUnsupported { set_id: set.id },
                ));
            }
            let validity = self.group_consistency_check(&pair)?;
            if !validity.allowed() {
                return Ok(validity);
            }
        }
        Ok(OperationValidity::Allowed)
    }

    /// Mode changes are allowed on ungrouped pairs whose set is reachable,
    /// allows pair granularity and supports the new mode.
    fn mode_change_on_pair(
        &self,
        pair: &ReplicationPairSpec,
        new_mode: ReplicationMode,
    ) -> Result<OperationValidity, SvcError> {
        let set = self.set(&pair.replication_set)?;
        if !set.reachable {
            Ok(OperationValidity::Denied(DeniedReason::Unreachable {
                element_type: ElementType::ReplicationSet,
                id: set.id.to_string(),
            }))
        } else if !set.supports_element_type(ElementType::ReplicationPair) {
            Ok(OperationValidity::Denied(
                DeniedReason::PairOperationsUnsupported { set_id: set.id },
            ))
        } else if pair.is_grouped() {
            Ok(OperationValidity::Denied(
                DeniedReason::GroupedPairModeChange {
                    pair_id: pair.id.clone(),
                },
            ))
        } else if !set.supports_mode(&new_mode) {
            Ok(OperationValidity::Denied(DeniedReason::ModeUnsupported {
                set_id: set.id,
                mode: new_mode,
            }))
        } else {
            Ok(OperationValidity::Allowed)
        }
    }

    /// No pair operation is allowed when consistency is enforced at the
    /// group level.
    fn group_consistency_check(
        &self,
        pair: &ReplicationPairSpec,
    ) -> Result<OperationValidity, SvcError> {
        let Some(group_id) = &pair.replication_group else {
            return Ok(OperationValidity::Allowed);
        };
        let group = self
            .specs
            .group(group_id)
            .ok_or(SvcError::GroupNotFound {
                group_id: group_id.clone(),
            })?;
        if group.group_consistency_enforced {
            Ok(OperationValidity::Denied(
                DeniedReason::GroupConsistencyEnforced { group_id: group.id },
            ))
        } else {
            Ok(OperationValidity::Allowed)
        }
    }

    fn pair(&self, pair_id: &PairId) -> Result<ReplicationPairSpec, SvcError> {
        self.specs.pair(pair_id).ok_or(SvcError::PairNotFound {
            pair_id: pair_id.clone(),
        })
    }

    fn set(&self, set_id: &SetId) -> Result<ReplicationSetSpec, SvcError> {
        self.specs.set(set_id).ok_or(SvcError::SetNotFound {
            set_id: set_id.clone(),
        })
    }
}

use crate::replication::driver::DriverError;
use rr_port::types::v0::transport::{
    ElementType, GroupId, OperationType, PairId, ReplicationMode, SetId, SystemId, VolumeId,
};
use snafu::Snafu;

/// Common error type for the agent services.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
#[allow(missing_docs)]
pub enum SvcError {
    #[snafu(display("Replication set '{}' not found", set_id))]
    SetNotFound { set_id: SetId },
    #[snafu(display("Replication group '{}' not found", group_id))]
    GroupNotFound { group_id: GroupId },
    #[snafu(display("Replication pair '{}' not found", pair_id))]
    PairNotFound { pair_id: PairId },
    #[snafu(display("Volume '{}' not found", volume_id))]
    VolumeNotFound { volume_id: VolumeId },
    #[snafu(display("Storage system '{}' not found", system_id))]
    SystemNotFound { system_id: SystemId },
    #[snafu(display(
        "Replication group named '{}' already exists in replication set '{}'",
        label,
        set_id
    ))]
    DuplicateGroupLabel { label: String, set_id: SetId },
    #[snafu(display(
        "Replication mode '{}' is not supported by replication set '{}'",
        mode,
        set_id
    ))]
    InvalidReplicationMode {
        mode: ReplicationMode,
        set_id: SetId,
    },
    #[snafu(display(
        "Group consistency must{} be enforced for mode '{}' in replication set '{}'",
        if *enforced { " not" } else { "" },
        mode,
        set_id
    ))]
    InvalidGroupConsistencyFlag {
        mode: ReplicationMode,
        set_id: SetId,
        enforced: bool,
    },
    #[snafu(display(
        "No replication set found for replication group '{}' on systems of type '{}'",
        group_id,
        system_type
    ))]
    NoSetForGroup {
        group_id: GroupId,
        system_type: String,
    },
    #[snafu(display(
        "Operation '{}' is not allowed on {} '{}': {}",
        operation,
        element_type,
        element_id,
        reason
    ))]
    OperationNotAllowed {
        operation: OperationType,
        element_type: ElementType,
        element_id: String,
        reason: String,
    },
    #[snafu(display(
        "Operation '{}' on {} '{}' failed in the device driver",
        operation,
        element_type,
        element_id
    ))]
    DriverDispatch {
        operation: OperationType,
        element_type: ElementType,
        element_id: String,
        source: DriverError,
    },
    #[snafu(display(
        "Failed to reconcile the srdf pair for source volume '{}' and target volume '{}'",
        source_volume,
        target_volume
    ))]
    SrdfReconcile {
        source_volume: VolumeId,
        target_volume: VolumeId,
        #[snafu(source(from(SvcError, Box::new)))]
        source: Box<SvcError>,
    },
    #[snafu(display("Failed to persist to the persistent store"))]
    Store { source: pstor::Error },
    #[snafu(display("Internal error: {}", details))]
    Internal { details: String },
}

impl From<pstor::Error> for SvcError {
    fn from(source: pstor::Error) -> Self {
        SvcError::Store { source }
    }
}

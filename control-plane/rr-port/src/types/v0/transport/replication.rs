use super::{CgId, GroupId, PairId, SetId, SystemId, TaskId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Replication mode of a link, set wide or per group/pair.
#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq, Hash,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ReplicationMode {
    /// Writes are acknowledged only once committed on the target array.
    Synchronous,
    /// Writes are shipped to the target array out of band.
    Asynchronous,
    /// Both sides accept writes (active/active).
    Active,
    /// Track changes and ship them opportunistically.
    AdaptiveCopy,
}

/// Replication state of a link.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ReplicationState {
    /// The link is replicating.
    Active,
    /// The link is catching up after (re)establishment.
    Synchronizing,
    /// Replication is paused but the relationship is kept.
    Suspended,
    /// The link is split, both sides are accessible.
    Split,
    /// Production runs on the target side.
    FailedOver,
    /// Source and target roles were exchanged.
    Swapped,
    /// The relationship is torn down.
    Stopped,
    /// The state could not be discovered.
    Unknown,
}

impl Default for ReplicationState {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Direction in which the data flows over a replication link.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ReplicationDirection {
    /// From the nominal source to the nominal target.
    SourceToTarget,
    /// Reversed, after a swap.
    TargetToSource,
}

/// Role of a storage system within a replication set.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ReplicationRole {
    Source,
    Target,
}

/// The current personality of a volume, as recorded on the volume itself
/// during discovery. Swap operations exchange the personalities without
/// changing the nominal pair roles.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum VolumePersonality {
    Source,
    Target,
}

/// The granularity levels at which replication elements exist and at which
/// link operations may be issued.
#[derive(
    Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq, Hash,
)]
pub enum ElementType {
    ReplicationPair,
    ConsistencyGroup,
    ReplicationGroup,
    ReplicationSet,
}

/// A state-changing action on a replication link.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum LinkOperation {
    Failover,
    Failback,
    Establish,
    Split,
    Suspend,
    Resume,
    Swap,
}

/// Every operation type which may be tracked through a task.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    CreateGroup,
    FailoverLink,
    FailbackLink,
    EstablishLink,
    SplitLink,
    SuspendLink,
    ResumeLink,
    SwapLink,
    ChangeMode,
}

impl From<LinkOperation> for OperationType {
    fn from(op: LinkOperation) -> Self {
        match op {
            LinkOperation::Failover => Self::FailoverLink,
            LinkOperation::Failback => Self::FailbackLink,
            LinkOperation::Establish => Self::EstablishLink,
            LinkOperation::Split => Self::SplitLink,
            LinkOperation::Suspend => Self::SuspendLink,
            LinkOperation::Resume => Self::ResumeLink,
            LinkOperation::Swap => Self::SwapLink,
        }
    }
}

/// State of a tracked operation.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub enum OperationState {
    /// The operation was dispatched and has not completed yet.
    InProgress,
    /// The operation could not be dispatched or failed, with the cause.
    Errored(String),
    /// The operation completed.
    Completed,
}

/// Status record of an operation tracked against a replication element.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct OperationStatus {
    /// The type of the tracked operation.
    pub operation: OperationType,
    /// Current state of the operation.
    pub state: OperationState,
}

impl OperationStatus {
    /// A freshly dispatched operation.
    pub fn in_progress(operation: OperationType) -> Self {
        Self {
            operation,
            state: OperationState::InProgress,
        }
    }
    /// Mark the operation as failed with the given cause.
    pub fn error(&mut self, cause: impl Into<String>) {
        self.state = OperationState::Errored(cause.into());
    }
    /// Check whether the operation failed.
    pub fn errored(&self) -> bool {
        matches!(self.state, OperationState::Errored(_))
    }
}

/// A replication element on which operations may be requested: a single
/// pair, all pairs whose volumes share a consistency group, a replication
/// group, or a whole replication set.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub enum ReplicationElement {
    Pair(PairId),
    ConsistencyGroup(CgId),
    Group(GroupId),
    Set(SetId),
}

impl ReplicationElement {
    /// The granularity level of this element.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Pair(_) => ElementType::ReplicationPair,
            Self::ConsistencyGroup(_) => ElementType::ConsistencyGroup,
            Self::Group(_) => ElementType::ReplicationGroup,
            Self::Set(_) => ElementType::ReplicationSet,
        }
    }
    /// The identifier of the element, as a string.
    pub fn id_str(&self) -> String {
        match self {
            Self::Pair(id) => id.to_string(),
            Self::ConsistencyGroup(id) => id.to_string(),
            Self::Group(id) => id.to_string(),
            Self::Set(id) => id.to_string(),
        }
    }
}

impl std::fmt::Display for ReplicationElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.element_type(), self.id_str())
    }
}

/// Storage-level address of a replication element, handed to the device
/// driver. The driver talks native identifiers, not control-plane uuids.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct DriverElement {
    /// The granularity level of the element.
    pub element_type: ElementType,
    /// The array-facing address of the element.
    pub address: String,
}

/// Handle of an operation accepted by the service and dispatched to the
/// device driver. Completion is reported asynchronously against the task.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct ReplicationTask {
    /// The element the operation acts on.
    pub element: ReplicationElement,
    /// The task tracking the operation.
    pub task: TaskId,
    /// Status of the operation at dispatch time.
    pub status: OperationStatus,
}

/// Request to create a replication group under a replication set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateReplicationGroup {
    /// The parent replication set.
    pub replication_set: SetId,
    /// User visible name of the group, unique within the parent set.
    pub display_name: String,
    /// The system holding the source volumes.
    pub source_system: SystemId,
    /// The system holding the target volumes.
    pub target_system: SystemId,
    /// Replication mode of the group, must be supported by the parent set.
    pub replication_mode: ReplicationMode,
    /// Initial replication state, `Active` when left unset.
    pub replication_state: Option<ReplicationState>,
    /// Whether operations on a subset of the group's pairs are forbidden.
    pub group_consistency_enforced: bool,
}

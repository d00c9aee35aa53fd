pub mod definitions;
pub mod group;
pub mod pair;
pub mod set;
pub mod system;
pub mod volume;

use crate::types::v0::transport::{OperationStatus, TaskId};
use std::collections::HashMap;

/// Operation statuses tracked against a replication element, keyed by the
/// task which initiated them.
pub type OpStatusMap = HashMap<TaskId, OperationStatus>;

use async_trait::async_trait;
use rr_port::types::v0::{
    store::group::ReplicationGroupSpec,
    transport::{DriverElement, ReplicationMode},
};
use snafu::Snafu;

/// Errors surfaced by a device driver while applying a request on the
/// arrays.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
#[allow(missing_docs)]
pub enum DriverError {
    #[snafu(display("The array rejected the request: {}", reason))]
    Rejected { reason: String },
    #[snafu(display("The array behind '{}' could not be reached", address))]
    Unreachable { address: String },
    #[snafu(display("The request timed out after {:?}", timeout))]
    Timeout { timeout: std::time::Duration },
}

/// Interface to the device driver which carries out replication requests
/// on the arrays. The control plane hands the driver array-facing
/// addresses, never its own identifiers.
#[async_trait]
pub trait ReplicationDriver: Send + Sync {
    /// Create the replication group on the arrays.
    async fn create_group(&self, group: &ReplicationGroupSpec) -> Result<(), DriverError>;
    /// Fail the link over to the target side.
    async fn failover_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// Fail the link back to the source side.
    async fn failback_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// (Re)establish replication over the link.
    async fn establish_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// Split the link, making both sides accessible.
    async fn split_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// Suspend replication over the link.
    async fn suspend_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// Resume replication over a suspended link.
    async fn resume_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// Exchange the source and target personalities of the link.
    async fn swap_link(&self, element: &DriverElement) -> Result<(), DriverError>;
    /// Change the replication mode of the link.
    async fn change_mode(
        &self,
        element: &DriverElement,
        mode: ReplicationMode,
    ) -> Result<(), DriverError>;
}

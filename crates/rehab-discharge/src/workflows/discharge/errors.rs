use super::domain::CitizenId;
use super::gateway::GatewayError;
use super::work_item::WorkItemError;

/// Failure that aborts the discharge of a single work item.
#[derive(Debug, thiserror::Error)]
pub enum DischargeError {
    #[error("citizen {0} not found in the case system")]
    CitizenNotFound(CitizenId),
    #[error("pathway view not found for citizen {0}")]
    PathwayNotFound(CitizenId),
    #[error(transparent)]
    WorkItem(#[from] WorkItemError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

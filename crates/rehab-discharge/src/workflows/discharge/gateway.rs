use super::domain::{
    ActivityLink, AuditEntry, Citizen, CitizenId, EntityHandle, Form, FormStatus, Intervention,
    Loan, OrganizationalRelation, PathwayTree, Reference, Task, TaskDraft, Transition,
};

/// Read side of the case-management system.
pub trait PathwayStore: Send + Sync {
    fn find_citizen(&self, id: &CitizenId) -> Result<Option<Citizen>, GatewayError>;
    /// Fetch the citizen's pathway view; `None` when the view does not exist.
    fn pathway(&self, citizen: &Citizen) -> Result<Option<PathwayTree>, GatewayError>;
    fn resolve_intervention(&self, reference: &Reference) -> Result<Intervention, GatewayError>;
    fn resolve_form(&self, reference: &Reference) -> Result<Form, GatewayError>;
    fn resolve_task(&self, handle: &EntityHandle) -> Result<Task, GatewayError>;
    fn form_history(&self, form: &Form) -> Result<Vec<AuditEntry>, GatewayError>;
    fn related_activities(&self, form: &Form) -> Result<Vec<ActivityLink>, GatewayError>;
    fn organization_relations(
        &self,
        citizen: &Citizen,
    ) -> Result<Vec<OrganizationalRelation>, GatewayError>;
    fn loans(&self, citizen: &Citizen) -> Result<Vec<Loan>, GatewayError>;
}

/// Write side of the case-management system.
pub trait CaseMutations: Send + Sync {
    fn transition_intervention(
        &self,
        intervention: &Intervention,
        transition: Transition,
    ) -> Result<(), GatewayError>;
    fn set_form_status(&self, form: &Form, status: FormStatus) -> Result<(), GatewayError>;
    fn delete_activity_link(&self, link: &ActivityLink) -> Result<(), GatewayError>;
    fn remove_organization_relation(
        &self,
        relation: &OrganizationalRelation,
    ) -> Result<(), GatewayError>;
    fn create_task(&self, draft: &TaskDraft) -> Result<EntityHandle, GatewayError>;
    fn close_task(&self, task: &Task) -> Result<(), GatewayError>;
}

/// Sink for process-completion events used in the municipality's robot statistics.
pub trait TrackingSink: Send + Sync {
    fn track_task(&self, process_name: &str) -> Result<(), GatewayError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("entity not found: {0}")]
    NotFound(EntityHandle),
    #[error("case system rejected the request: {0}")]
    Rejected(String),
    #[error("case system unavailable: {0}")]
    Unavailable(String),
}

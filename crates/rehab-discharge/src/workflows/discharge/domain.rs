use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Resolvable handle for an entity in the case system (the `self` link in Nexus).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub String);

impl EntityHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Citizen identifier as carried on work items (CPR or Nexus patient identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CitizenId(pub String);

impl fmt::Display for CitizenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
    pub id: CitizenId,
    pub handle: EntityHandle,
    #[serde(default)]
    pub name: Option<String>,
}

/// Reference type discriminator. The serialized names are the Nexus reference types,
/// which also appear as the last segment of type-addressed path patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    #[serde(rename = "basketGrantReference")]
    Intervention,
    #[serde(rename = "formDataV2Reference")]
    Form,
    #[serde(rename = "organizationReference")]
    OrganizationRelation,
    #[serde(rename = "loanReference")]
    Loan,
    #[serde(rename = "taskReference")]
    Task,
    #[serde(other)]
    Other,
}

impl ReferenceKind {
    pub const fn tag(self) -> &'static str {
        match self {
            ReferenceKind::Intervention => "basketGrantReference",
            ReferenceKind::Form => "formDataV2Reference",
            ReferenceKind::OrganizationRelation => "organizationReference",
            ReferenceKind::Loan => "loanReference",
            ReferenceKind::Task => "taskReference",
            ReferenceKind::Other => "",
        }
    }
}

/// One node of a citizen's pathway tree, flattened with its ancestor path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub handle: EntityHandle,
    /// Names of the ancestor nodes from the tree root down to the parent.
    #[serde(default)]
    pub path: Vec<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    /// Form data status for form references; absent for other kinds.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default = "active_by_default")]
    pub active_pathway: bool,
}

fn active_by_default() -> bool {
    true
}

/// Immutable snapshot of a citizen's references for the duration of one work item.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayTree {
    pub citizen: CitizenId,
    pub references: Vec<Reference>,
}

impl PathwayTree {
    pub fn new(citizen: CitizenId, references: Vec<Reference>) -> Self {
        Self {
            citizen,
            references,
        }
    }
}

/// Workflow state of an intervention, serialized with the Nexus state names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    #[serde(rename = "Ansøgt")]
    Requested,
    #[serde(rename = "Bevilget")]
    Granted,
    #[serde(rename = "Tildelt")]
    Assigned,
    #[serde(rename = "Ændret")]
    Changed,
    #[serde(rename = "Afsluttet")]
    Ended,
    #[serde(rename = "Fjernet")]
    Removed,
    #[serde(rename = "Afslået")]
    Rejected,
    #[serde(other)]
    Unknown,
}

impl WorkflowState {
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            WorkflowState::Requested
                | WorkflowState::Granted
                | WorkflowState::Assigned
                | WorkflowState::Changed
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            WorkflowState::Requested => "Ansøgt",
            WorkflowState::Granted => "Bevilget",
            WorkflowState::Assigned => "Tildelt",
            WorkflowState::Changed => "Ændret",
            WorkflowState::Ended => "Afsluttet",
            WorkflowState::Removed => "Fjernet",
            WorkflowState::Rejected => "Afslået",
            WorkflowState::Unknown => "Ukendt",
        }
    }
}

/// Workflow transition applied when closing an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    #[serde(rename = "Fjern")]
    Remove,
    #[serde(rename = "Afslut")]
    Close,
}

impl Transition {
    /// Assigned interventions were never started and are removed; everything else is closed.
    pub const fn for_state(state: WorkflowState) -> Self {
        match state {
            WorkflowState::Assigned => Transition::Remove,
            _ => Transition::Close,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Transition::Remove => "Fjern",
            Transition::Close => "Afslut",
        }
    }

    pub const fn resulting_state(self) -> WorkflowState {
        match self {
            Transition::Remove => WorkflowState::Removed,
            Transition::Close => WorkflowState::Ended,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub handle: EntityHandle,
    pub name: String,
    pub workflow_state: WorkflowState,
    /// Name of the supplier organization the intervention is attributed to.
    #[serde(default)]
    pub provider: Option<String>,
}

impl Intervention {
    pub fn supplied_by(&self, provider: &str) -> bool {
        self.provider.as_deref() == Some(provider)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormStatus {
    #[serde(rename = "Aktivt")]
    Active,
    #[serde(rename = "Inaktivt")]
    Inactive,
}

impl FormStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FormStatus::Active => "Aktivt",
            FormStatus::Inactive => "Inaktivt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub handle: EntityHandle,
    pub name: String,
    pub status: FormStatus,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Entry of a form's audit history; only the author's primary organization matters here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Link between a form and an activity, deleted through its own handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLink {
    pub handle: EntityHandle,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationalRelation {
    pub handle: EntityHandle,
    pub organization: String,
}

/// Equipment loan registered on the citizen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub handle: EntityHandle,
    #[serde(default)]
    pub grant: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Aktiv")]
    Open,
    #[serde(rename = "Lukket")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub handle: EntityHandle,
    #[serde(default)]
    pub title: String,
    pub status: TaskStatus,
}

/// Fields sent when creating a task on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub target: EntityHandle,
    pub task_type: String,
    pub title: String,
    pub responsible_organization: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: String,
}

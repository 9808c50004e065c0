//! Discharge of citizens from a rehabilitation provider.
//!
//! A work item names a citizen and a provider. The rule engine walks the citizen's
//! pathway snapshot in four ordered stages (interventions, forms and affiliation,
//! authority blockers) and the task service closes or redirects the originating task
//! based on the resulting [`DischargeOutcome`].

pub mod domain;
pub mod errors;
pub mod gateway;
pub mod intake;
pub mod interventions;
pub mod memory;
pub mod outcome;
pub mod path_filter;
pub mod policy;
pub mod router;
pub mod rules;
pub mod service;
pub mod tasks;
pub mod work_item;
pub mod worker;

#[cfg(test)]
mod tests;

pub use domain::{
    ActivityLink, AuditEntry, Citizen, CitizenId, EntityHandle, Form, FormStatus, Intervention,
    Loan, OrganizationalRelation, PathwayTree, Reference, ReferenceKind, Task, TaskDraft,
    TaskStatus, Transition, WorkflowState,
};
pub use errors::DischargeError;
pub use gateway::{CaseMutations, GatewayError, PathwayStore, TrackingSink};
pub use intake::{parse_activity_list, select_work_items, IntakeError, IntakeRules};
pub use interventions::{InterventionResolver, ResolvedIntervention};
pub use memory::{CaseSnapshot, CitizenRecord, FormRecord, InMemoryCaseSystem, RecordedMutation};
pub use outcome::{DischargeOutcome, DischargeStage, EndedReason};
pub use path_filter::{filter_by_path, PathPattern};
pub use policy::{DischargePolicy, LOAN_FOLLOW_UP_BODY};
pub use router::{discharge_router, WorkItemRequest};
pub use rules::{DischargeRuleEngine, StageLog, SubOperation, SubOperationFailure, TransitionRecord};
pub use service::{DischargeReport, DischargeService};
pub use tasks::{FinalizeSummary, TaskActionService};
pub use work_item::{WorkItemError, WorkItemPayload};
pub use worker::{
    write_results_csv, DischargeWorker, WorkItem, WorkItemResult, WorkItemStatus,
    DEFAULT_RESULT_CAPACITY,
};

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::domain::{
    ActivityLink, AuditEntry, Citizen, CitizenId, EntityHandle, Form, FormStatus, Intervention,
    Loan, OrganizationalRelation, PathwayTree, Reference, Task, TaskDraft, TaskStatus, Transition,
};
use super::gateway::{CaseMutations, GatewayError, PathwayStore, TrackingSink};

/// Serialized case data the in-memory system is loaded from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseSnapshot {
    #[serde(default)]
    pub citizens: Vec<CitizenRecord>,
    #[serde(default)]
    pub interventions: Vec<Intervention>,
    #[serde(default)]
    pub forms: Vec<FormRecord>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenRecord {
    #[serde(flatten)]
    pub citizen: Citizen,
    /// `None` models a citizen whose pathway view cannot be found.
    #[serde(default)]
    pub pathway: Option<Vec<Reference>>,
    #[serde(default)]
    pub relations: Vec<OrganizationalRelation>,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    #[serde(flatten)]
    pub form: Form,
    #[serde(default)]
    pub history: Vec<AuditEntry>,
    #[serde(default)]
    pub activities: Vec<ActivityLink>,
}

/// Mutation applied to the in-memory system, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedMutation {
    Transition {
        handle: EntityHandle,
        transition: Transition,
    },
    FormStatus {
        handle: EntityHandle,
        status: FormStatus,
    },
    DeleteActivityLink {
        handle: EntityHandle,
    },
    RemoveRelation {
        handle: EntityHandle,
    },
    CreateTask {
        handle: EntityHandle,
        draft: TaskDraft,
    },
    CloseTask {
        handle: EntityHandle,
    },
}

#[derive(Debug, Default)]
struct CaseState {
    citizens: BTreeMap<CitizenId, CitizenRecord>,
    interventions: BTreeMap<EntityHandle, Intervention>,
    forms: BTreeMap<EntityHandle, FormRecord>,
    tasks: BTreeMap<EntityHandle, Task>,
    journal: Vec<RecordedMutation>,
    tracked: Vec<String>,
    failing: HashSet<EntityHandle>,
    created_tasks: u64,
}

impl CaseState {
    fn guard(&self, handle: &EntityHandle) -> Result<(), GatewayError> {
        if self.failing.contains(handle) {
            return Err(GatewayError::Rejected(format!("mutation of {handle} refused")));
        }
        Ok(())
    }
}

/// Case system held in memory: backs the dry-run CLI, the HTTP service and the tests.
#[derive(Debug, Default)]
pub struct InMemoryCaseSystem {
    state: Mutex<CaseState>,
}

impl InMemoryCaseSystem {
    pub fn from_snapshot(snapshot: CaseSnapshot) -> Self {
        let state = CaseState {
            citizens: snapshot
                .citizens
                .into_iter()
                .map(|record| (record.citizen.id.clone(), record))
                .collect(),
            interventions: snapshot
                .interventions
                .into_iter()
                .map(|intervention| (intervention.handle.clone(), intervention))
                .collect(),
            forms: snapshot
                .forms
                .into_iter()
                .map(|record| (record.form.handle.clone(), record))
                .collect(),
            tasks: snapshot
                .tasks
                .into_iter()
                .map(|task| (task.handle.clone(), task))
                .collect(),
            ..CaseState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<CaseSnapshot>(raw).map(Self::from_snapshot)
    }

    /// Make every later mutation of `handle` fail. Task creation is matched on its target.
    pub fn fail_mutations_for(&self, handle: impl Into<String>) {
        self.lock().failing.insert(EntityHandle(handle.into()));
    }

    pub fn mutations(&self) -> Vec<RecordedMutation> {
        self.lock().journal.clone()
    }

    pub fn tracked_events(&self) -> Vec<String> {
        self.lock().tracked.clone()
    }

    pub fn intervention(&self, handle: &str) -> Option<Intervention> {
        self.lock()
            .interventions
            .get(&EntityHandle::new(handle))
            .cloned()
    }

    pub fn form(&self, handle: &str) -> Option<Form> {
        self.lock()
            .forms
            .get(&EntityHandle::new(handle))
            .map(|record| record.form.clone())
    }

    pub fn task(&self, handle: &str) -> Option<Task> {
        self.lock().tasks.get(&EntityHandle::new(handle)).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CaseState> {
        self.state.lock().expect("case state mutex poisoned")
    }
}

impl PathwayStore for InMemoryCaseSystem {
    fn find_citizen(&self, id: &CitizenId) -> Result<Option<Citizen>, GatewayError> {
        Ok(self
            .lock()
            .citizens
            .get(id)
            .map(|record| record.citizen.clone()))
    }

    fn pathway(&self, citizen: &Citizen) -> Result<Option<PathwayTree>, GatewayError> {
        let state = self.lock();
        let record = state
            .citizens
            .get(&citizen.id)
            .ok_or_else(|| GatewayError::NotFound(citizen.handle.clone()))?;
        Ok(record
            .pathway
            .clone()
            .map(|references| PathwayTree::new(citizen.id.clone(), references)))
    }

    fn resolve_intervention(&self, reference: &Reference) -> Result<Intervention, GatewayError> {
        self.lock()
            .interventions
            .get(&reference.handle)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(reference.handle.clone()))
    }

    fn resolve_form(&self, reference: &Reference) -> Result<Form, GatewayError> {
        self.lock()
            .forms
            .get(&reference.handle)
            .map(|record| record.form.clone())
            .ok_or_else(|| GatewayError::NotFound(reference.handle.clone()))
    }

    fn resolve_task(&self, handle: &EntityHandle) -> Result<Task, GatewayError> {
        self.lock()
            .tasks
            .get(handle)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(handle.clone()))
    }

    fn form_history(&self, form: &Form) -> Result<Vec<AuditEntry>, GatewayError> {
        self.lock()
            .forms
            .get(&form.handle)
            .map(|record| record.history.clone())
            .ok_or_else(|| GatewayError::NotFound(form.handle.clone()))
    }

    fn related_activities(&self, form: &Form) -> Result<Vec<ActivityLink>, GatewayError> {
        self.lock()
            .forms
            .get(&form.handle)
            .map(|record| record.activities.clone())
            .ok_or_else(|| GatewayError::NotFound(form.handle.clone()))
    }

    fn organization_relations(
        &self,
        citizen: &Citizen,
    ) -> Result<Vec<OrganizationalRelation>, GatewayError> {
        Ok(self
            .lock()
            .citizens
            .get(&citizen.id)
            .map(|record| record.relations.clone())
            .unwrap_or_default())
    }

    fn loans(&self, citizen: &Citizen) -> Result<Vec<Loan>, GatewayError> {
        Ok(self
            .lock()
            .citizens
            .get(&citizen.id)
            .map(|record| record.loans.clone())
            .unwrap_or_default())
    }
}

impl CaseMutations for InMemoryCaseSystem {
    fn transition_intervention(
        &self,
        intervention: &Intervention,
        transition: Transition,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.guard(&intervention.handle)?;
        let stored = state
            .interventions
            .get_mut(&intervention.handle)
            .ok_or_else(|| GatewayError::NotFound(intervention.handle.clone()))?;
        stored.workflow_state = transition.resulting_state();
        state.journal.push(RecordedMutation::Transition {
            handle: intervention.handle.clone(),
            transition,
        });
        Ok(())
    }

    fn set_form_status(&self, form: &Form, status: FormStatus) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.guard(&form.handle)?;
        let record = state
            .forms
            .get_mut(&form.handle)
            .ok_or_else(|| GatewayError::NotFound(form.handle.clone()))?;
        record.form.status = status;

        for citizen in state.citizens.values_mut() {
            let references = citizen.pathway.iter_mut().flatten();
            for reference in references.filter(|reference| reference.handle == form.handle) {
                reference.status = Some(status.label().to_string());
            }
        }

        state.journal.push(RecordedMutation::FormStatus {
            handle: form.handle.clone(),
            status,
        });
        Ok(())
    }

    fn delete_activity_link(&self, link: &ActivityLink) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.guard(&link.handle)?;
        for record in state.forms.values_mut() {
            record
                .activities
                .retain(|activity| activity.handle != link.handle);
        }
        state.journal.push(RecordedMutation::DeleteActivityLink {
            handle: link.handle.clone(),
        });
        Ok(())
    }

    fn remove_organization_relation(
        &self,
        relation: &OrganizationalRelation,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.guard(&relation.handle)?;
        for citizen in state.citizens.values_mut() {
            citizen
                .relations
                .retain(|existing| existing.handle != relation.handle);
        }
        state.journal.push(RecordedMutation::RemoveRelation {
            handle: relation.handle.clone(),
        });
        Ok(())
    }

    fn create_task(&self, draft: &TaskDraft) -> Result<EntityHandle, GatewayError> {
        let mut state = self.lock();
        state.guard(&draft.target)?;
        state.created_tasks += 1;
        let handle = EntityHandle(format!("created-task-{}", state.created_tasks));
        state.tasks.insert(
            handle.clone(),
            Task {
                handle: handle.clone(),
                title: draft.title.clone(),
                status: TaskStatus::Open,
            },
        );
        state.journal.push(RecordedMutation::CreateTask {
            handle: handle.clone(),
            draft: draft.clone(),
        });
        Ok(handle)
    }

    fn close_task(&self, task: &Task) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.guard(&task.handle)?;
        let stored = state
            .tasks
            .get_mut(&task.handle)
            .ok_or_else(|| GatewayError::NotFound(task.handle.clone()))?;
        stored.status = TaskStatus::Closed;
        state.journal.push(RecordedMutation::CloseTask {
            handle: task.handle.clone(),
        });
        Ok(())
    }
}

impl TrackingSink for InMemoryCaseSystem {
    fn track_task(&self, process_name: &str) -> Result<(), GatewayError> {
        self.lock().tracked.push(process_name.to_string());
        Ok(())
    }
}
